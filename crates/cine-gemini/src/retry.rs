//! Retry utilities with exponential backoff.
//!
//! Generation requests are retried only when the provider signals a rate
//! limit. Any other failure is returned to the caller untouched on the first
//! attempt, and running out of attempts produces a terminal error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info_span, warn, Instrument};

use crate::error::GeminiError;
use crate::metrics::record_retry;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between attempts, before jitter.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(32_000),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: std::env::var("GEMINI_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
            base_delay: Duration::from_millis(
                std::env::var("GEMINI_RETRY_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            max_delay: Duration::from_millis(
                std::env::var("GEMINI_RETRY_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(32_000),
            ),
            jitter: defaults.jitter,
        }
    }

    /// Set the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the jitter bound.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff before retrying after the given (zero-based) failed attempt, without jitter.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// Classification hooks the retry loop needs from an error type.
pub trait RetrySignal: Display + Sized {
    /// True if the failure indicates a rate limit and may be retried.
    fn is_rate_limited(&self) -> bool;

    /// Wrap the last failure once all attempts are used up.
    fn retries_exhausted(attempts: u32, last: Self) -> Self;
}

impl RetrySignal for GeminiError {
    fn is_rate_limited(&self) -> bool {
        GeminiError::is_rate_limited(self)
    }

    fn retries_exhausted(attempts: u32, last: Self) -> Self {
        GeminiError::MaxRetriesExceeded {
            attempts,
            last: Box::new(last),
        }
    }
}

/// Execute an async operation, retrying rate-limited failures.
///
/// The operation runs at most `config.max_attempts` times. Non-rate-limit
/// errors propagate immediately and unchanged. When the last attempt is also
/// rate limited, the error is wrapped via [`RetrySignal::retries_exhausted`].
///
/// # Example
/// ```ignore
/// let config = RetryConfig::default().with_max_attempts(3);
/// let response = with_retry(&config, "frame_image", || {
///     provider.generate_content(model, &request)
/// }).await?;
/// ```
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetrySignal,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let span = info_span!("provider_call", operation = %operation, attempt = attempt);

        match op().instrument(span).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = %operation, attempt, "Succeeded after rate-limit retries");
                }
                return Ok(value);
            }
            Err(e) if !e.is_rate_limited() => return Err(e),
            Err(e) if attempt < max_attempts => {
                let delay = config.jittered_delay(attempt - 1);
                warn!(
                    operation = %operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, retrying: {}",
                    e
                );
                record_retry(operation);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(operation = %operation, attempts = attempt, "Max retries exceeded: {}", e);
                return Err(E::retries_exhausted(attempt, e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig::default()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(Duration::ZERO)
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let config = RetryConfig::default().with_base_delay(Duration::from_millis(100));

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(30), config.max_delay);
    }

    #[test]
    fn test_jitter_stays_within_bound() {
        let config = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(Duration::from_millis(50));

        for _ in 0..50 {
            let delay = config.jittered_delay(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_k_rate_limits() {
        let config = fast_config(5);
        let calls = AtomicU32::new(0);

        let result: Result<u32, GeminiError> = with_retry(&config, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(GeminiError::from_http_status(429, "slow down"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(tokio_test::assert_ok!(result), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_rate_limit_error_is_not_retried() {
        let config = fast_config(5);
        let calls = AtomicU32::new(0);

        let result: Result<u32, GeminiError> = with_retry(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GeminiError::api(400, "bad prompt")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result {
            Err(GeminiError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad prompt");
            }
            other => panic!("expected the original error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_is_terminal() {
        let config = fast_config(3);
        let calls = AtomicU32::new(0);

        let result: Result<u32, GeminiError> = with_retry(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GeminiError::from_http_status(429, "quota")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(GeminiError::MaxRetriesExceeded { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.is_rate_limited());
            }
            other => panic!("expected MaxRetriesExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generic_over_error_type() {
        #[derive(Debug, PartialEq)]
        enum TestError {
            Busy,
            Gone(u32),
        }

        impl Display for TestError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:?}", self)
            }
        }

        impl RetrySignal for TestError {
            fn is_rate_limited(&self) -> bool {
                matches!(self, TestError::Busy)
            }

            fn retries_exhausted(attempts: u32, _last: Self) -> Self {
                TestError::Gone(attempts)
            }
        }

        let result: Result<(), TestError> =
            with_retry(&fast_config(2), "test", || async { Err(TestError::Busy) }).await;
        assert_eq!(result, Err(TestError::Gone(2)));
    }
}
