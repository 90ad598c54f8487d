//! HTTP client for the MET Norway Frost API with bounded retry.

use crate::fetch::attempt::{classify_response, run_with_retry, AttemptOutcome};
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Fetches observation pages from the Frost API, masking transient
/// failures behind a bounded retry loop.
///
/// The credential is the Frost client id, sent as the username of an HTTP
/// Basic pair with an empty password. A failed fetch is signalled by
/// absence, never by an error: rate limiting, server errors and transport
/// failures are retried up to the attempt budget, while credential
/// failures, malformed success bodies and unexpected status codes abort
/// immediately.
///
/// Each call can block for up to
/// `max_attempts × (request timeout + retry delay)`, so callers wanting an
/// upper bound should wrap the call in their own timeout.
///
/// # Examples
///
/// ```no_run
/// use vaerdata::FrostClient;
///
/// # async fn run() {
/// let client = FrostClient::new(
///     "https://frost.met.no/observations/v0.jsonld",
///     "my-client-id",
/// );
/// let query = [
///     ("sources", "SN18700"),
///     ("elements", "mean(air_temperature P1D)"),
///     ("referencetime", "2022-01-01/2022-12-31"),
/// ];
/// if let Some(document) = client.fetch(&query).await {
///     println!("{document}");
/// }
/// # }
/// ```
pub struct FrostClient {
    http: Client,
    endpoint: String,
    client_id: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl FrostClient {
    /// Creates a client for `endpoint` authenticated with `client_id`,
    /// using the default retry policy of 3 attempts spaced 2 seconds apart.
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Overrides the retry policy.
    ///
    /// `max_attempts` counts every attempt, including the first; a value of
    /// 1 disables retrying entirely.
    pub fn with_retry_policy(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Fetches one page of observations for the given query parameters.
    ///
    /// Returns the parsed JSON document from the first successful attempt,
    /// or `None` when every attempt failed; diagnostics for each failed
    /// attempt are emitted through the `log` facade.
    pub async fn fetch(&self, query: &[(&str, &str)]) -> Option<Value> {
        run_with_retry(
            move |n| self.attempt(query, n),
            self.max_attempts,
            self.retry_delay,
        )
        .await
    }

    async fn attempt(&self, query: &[(&str, &str)], number: u32) -> AttemptOutcome {
        debug!("attempt {number}: GET {}", self.endpoint);
        let response = self
            .http
            .get(&self.endpoint)
            .query(query)
            .basic_auth(&self.client_id, Some(""))
            .send()
            .await;

        match response {
            Err(e) => AttemptOutcome::Retryable(format!("network error: {e}")),
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Err(e) => {
                        AttemptOutcome::Retryable(format!("failed to read response body: {e}"))
                    }
                    Ok(body) => classify_response(status, &body),
                }
            }
        }
    }
}
