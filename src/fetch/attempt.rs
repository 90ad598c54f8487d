//! Outcome classification and the retry loop for one observation fetch.
//!
//! Each HTTP attempt is reduced to an [`AttemptOutcome`] so that the retry
//! loop dispatches purely on the variant and carries no HTTP knowledge of
//! its own. Transient conditions (rate limiting, server errors, transport
//! failures) are retried; permanent ones (bad credential, malformed success
//! body, unexpected status) abort immediately so that no attempt is wasted
//! on an unrecoverable error.

use log::warn;
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// The result of a single request attempt.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// HTTP 200 with a parseable JSON body.
    Success(Value),
    /// A transient failure worth retrying after a delay.
    Retryable(String),
    /// A permanent failure; further attempts would be wasted.
    Fatal(String),
}

/// Classifies one HTTP response into an [`AttemptOutcome`].
pub(crate) fn classify_response(status: StatusCode, body: &str) -> AttemptOutcome {
    match status {
        StatusCode::OK => match serde_json::from_str(body) {
            Ok(document) => AttemptOutcome::Success(document),
            Err(e) => AttemptOutcome::Fatal(format!("response body was not valid JSON: {e}")),
        },
        StatusCode::UNAUTHORIZED => {
            AttemptOutcome::Fatal("invalid client id (401 Unauthorized)".to_string())
        }
        StatusCode::FORBIDDEN => {
            AttemptOutcome::Fatal("access denied (403 Forbidden)".to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AttemptOutcome::Retryable("rate limited (429 Too Many Requests)".to_string())
        }
        s if s.is_server_error() => AttemptOutcome::Retryable(format!("server error ({s})")),
        s => AttemptOutcome::Fatal(format!("request failed with status {s}")),
    }
}

/// Drives `attempt` up to `max_attempts` times (1-indexed), sleeping
/// `retry_delay` between retryable failures.
///
/// Returns the parsed document from the first successful attempt, or `None`
/// once a fatal outcome is seen or the attempt budget is exhausted. Every
/// failure path emits a diagnostic; none of them surface as errors.
pub(crate) async fn run_with_retry<F, Fut>(
    mut attempt: F,
    max_attempts: u32,
    retry_delay: Duration,
) -> Option<Value>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    for n in 1..=max_attempts {
        match attempt(n).await {
            AttemptOutcome::Success(document) => return Some(document),
            AttemptOutcome::Fatal(reason) => {
                warn!("attempt {n} of {max_attempts} failed permanently: {reason}");
                return None;
            }
            AttemptOutcome::Retryable(reason) => {
                warn!("attempt {n} of {max_attempts} failed: {reason}");
                // No point sleeping once the budget is spent.
                if n < max_attempts {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }
    warn!("giving up after {max_attempts} attempts");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn scripted(
        outcomes: Vec<AttemptOutcome>,
    ) -> (
        impl FnMut(u32) -> std::pin::Pin<Box<dyn Future<Output = AttemptOutcome>>>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let script = Arc::new(Mutex::new(outcomes));
        let attempt = move |_n: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            let next = script.lock().unwrap().remove(0);
            Box::pin(async move { next }) as std::pin::Pin<Box<dyn Future<Output = _>>>
        };
        (attempt, calls)
    }

    #[test]
    fn ok_with_valid_json_is_success() {
        let outcome = classify_response(StatusCode::OK, r#"{"data": []}"#);
        assert!(matches!(outcome, AttemptOutcome::Success(_)));
    }

    #[test]
    fn ok_with_invalid_json_is_fatal() {
        let outcome = classify_response(StatusCode::OK, "not json at all");
        assert!(matches!(outcome, AttemptOutcome::Fatal(_)));
    }

    #[test]
    fn credential_failures_are_fatal() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let outcome = classify_response(status, "");
            assert!(matches!(outcome, AttemptOutcome::Fatal(_)), "{status}");
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let outcome = classify_response(status, "");
            assert!(matches!(outcome, AttemptOutcome::Retryable(_)), "{status}");
        }
    }

    #[test]
    fn unexpected_status_is_fatal() {
        let outcome = classify_response(StatusCode::NOT_FOUND, "");
        assert!(matches!(outcome, AttemptOutcome::Fatal(_)));
    }

    #[tokio::test]
    async fn retries_until_success() {
        // 429 then 500 then a good body: the third attempt wins.
        let (attempt, calls) = scripted(vec![
            classify_response(StatusCode::TOO_MANY_REQUESTS, ""),
            classify_response(StatusCode::INTERNAL_SERVER_ERROR, ""),
            classify_response(StatusCode::OK, r#"{"count": 1}"#),
        ]);

        let document = run_with_retry(attempt, 3, Duration::ZERO).await;
        assert_eq!(document, Some(json!({"count": 1})));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_outcome_stops_after_one_attempt() {
        let (attempt, calls) = scripted(vec![classify_response(StatusCode::UNAUTHORIZED, "")]);

        let document = run_with_retry(attempt, 3, Duration::ZERO).await;
        assert_eq!(document, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_success_body_is_not_retried() {
        let (attempt, calls) = scripted(vec![classify_response(StatusCode::OK, "{broken")]);

        let document = run_with_retry(attempt, 3, Duration::ZERO).await;
        assert_eq!(document, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_consumes_the_whole_budget() {
        let (attempt, calls) = scripted(vec![
            AttemptOutcome::Retryable("network error".to_string()),
            AttemptOutcome::Retryable("network error".to_string()),
            AttemptOutcome::Retryable("network error".to_string()),
        ]);

        let document = run_with_retry(attempt, 3, Duration::ZERO).await;
        assert_eq!(document, None);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn success_on_first_attempt_skips_the_rest() {
        let (attempt, calls) = scripted(vec![
            classify_response(StatusCode::OK, r#"{"data": [1, 2]}"#),
            AttemptOutcome::Fatal("should never be reached".to_string()),
        ]);

        let document = run_with_retry(attempt, 3, Duration::ZERO).await;
        assert_eq!(document, Some(json!({"data": [1, 2]})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
