//! Configuration for the sync engine.

use permit_sync_protocol::{encode_path_segment, PERMITS_PATH};
use rand::Rng;
use std::time::Duration;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Server base URL, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Collection path appended to the base URL.
    pub collection_path: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration for collection fetches.
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection_path: PERMITS_PATH.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::no_retry(),
        }
    }

    /// Sets the collection path.
    pub fn with_collection_path(mut self, path: impl Into<String>) -> Self {
        self.collection_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// URL of the whole collection.
    pub fn collection_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.collection_path
        )
    }

    /// URL of a single permit.
    pub fn item_url(&self, id: &str) -> String {
        format!("{}{}", self.collection_url(), encode_path_segment(id))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Disables jitter.
    pub fn without_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        if self.add_jitter {
            // Up to 25% jitter
            let jitter = delay_secs * 0.25 * rand::thread_rng().gen::<f64>();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::no_retry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new("https://permits.example.gov/")
            .with_collection_path("/api/permits/")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.collection_url(),
            "https://permits.example.gov/api/permits/"
        );
        assert_eq!(
            config.item_url("abc"),
            "https://permits.example.gov/api/permits/abc"
        );
    }

    #[test]
    fn item_url_escapes_identifier() {
        let config = SyncConfig::new("https://permits.example.gov");
        assert_eq!(
            config.item_url("../admin?x#y"),
            "https://permits.example.gov/permits/..%2Fadmin%3Fx%23y"
        );
    }

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.collection_path, PERMITS_PATH);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn retry_delay_calculation() {
        let config = RetryConfig::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);

        let delay1 = config.delay_for_attempt(1);
        assert!(delay1 >= Duration::from_millis(100));
        assert!(delay1 <= Duration::from_millis(125));

        let delay2 = config.delay_for_attempt(2);
        assert!(delay2 >= Duration::from_millis(200));
    }

    #[test]
    fn retry_delay_respects_max() {
        let config = RetryConfig::new(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(10.0)
            .without_jitter();

        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(5));
    }
}
