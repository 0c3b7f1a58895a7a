use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{FactoryError, FactoryResult};

/// Retry policy for building a client at startup
///
/// The factories never retry on their own. Callers that would rather wait for a cache
/// that is still coming up than abort opt in through the `*_with_retry` constructors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first one
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound for the delay between attempts
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (typically 2.0)
    pub backoff_multiplier: f64,

    /// Whether to add jitter to prevent thundering herd
    pub use_jitter: bool,
}

impl RetryConfig {
    /// Defaults: 3 retries, 100ms initial delay, 5s max delay, x2 backoff, jitter on
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Delay to wait before retry number `attempt` (1-based), before jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled.max(0.0))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Retry a factory operation with exponential backoff.
///
/// Stops early on errors that are not retryable (cancellation, invalid configuration)
/// and when `cancel` fires while waiting between attempts.
pub async fn retry_with_backoff<F, Fut, T>(
    cancel: &CancellationToken,
    mut operation: F,
    config: RetryConfig,
) -> FactoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FactoryResult<T>>,
{
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(retries = attempt, "Operation succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        attempt += 1;

        if !err.is_retryable() || attempt > config.max_retries {
            warn!(attempts = attempt, error = %err, "Giving up");
            return Err(err);
        }

        let delay = if config.use_jitter {
            apply_jitter(config.delay_for(attempt))
        } else {
            config.delay_for(attempt)
        };

        debug!(
            attempt,
            max_retries = config.max_retries,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "Operation failed, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled_from(err)),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Retry with [`RetryConfig::default`]
pub async fn retry<F, Fut, T>(cancel: &CancellationToken, operation: F) -> FactoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FactoryResult<T>>,
{
    retry_with_backoff(cancel, operation, RetryConfig::default()).await
}

fn cancelled_from(err: FactoryError) -> FactoryError {
    match err {
        FactoryError::PingFailed(mode, _) => FactoryError::Cancelled(mode),
        other => other,
    }
}

/// Scale a delay by a pseudo-random factor in `[0.5, 1.0)`.
fn apply_jitter(delay: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    delay.mul_f64(random_factor)
}
