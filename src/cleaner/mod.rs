mod error;
mod weather_cleaner;

pub use error::CleanError;
pub use weather_cleaner::WeatherCleaner;
