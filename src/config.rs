//! Settings for the live transaction store.

use std::time::Duration;

use crate::sync::RetryPolicy;

/// The default number of times to retry a live query whose index is not ready.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// The default wait between retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configures how the live transaction store talks to the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// How many times to re-establish a live query that failed because the
    /// store's index is still being built.
    pub max_retries: u32,
    /// How long to wait before each retry. The delay is fixed, not exponential.
    pub retry_delay: Duration,
}

impl SyncConfig {
    /// The retry policy described by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: self.retry_delay,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}
