//! Configuration types for the Toolbus SDK.

use std::time::Duration;
use url::Url;

/// Server URL used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Configuration for the Toolbus client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the tool server.
    pub server_url: Url,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Total attempt budget for a call, including the first attempt.
    pub retries: u32,
    /// Backoff shape between attempts.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Create a new configuration with the given server URL.
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            timeout: Duration::from_secs(30),
            retries: 3,
            retry: RetryConfig::default(),
        }
    }
}

/// Configuration for retry backoff behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Backoff slept after the first failed attempt.
    pub initial_backoff: Duration,
    /// Backoff multiplier per subsequent attempt.
    pub backoff_multiplier: f64,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Calculate backoff duration for a given zero-based attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }
}
