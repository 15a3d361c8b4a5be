//! Retry logic with configurable backoff
//!
//! Provides a small composable retry mechanism for async operations:
//! - Fixed or exponential backoff, with optional jitter
//! - A caller-supplied predicate deciding which errors are worth retrying
//! - Attempt accounting so callers can tell exhaustion from a hard failure
//!
//! # Example
//!
//! ```rust,no_run
//! use cozycampus_core::retry::{retry_async, RetryConfig};
//!
//! # async fn run() {
//! let result = retry_async(&RetryConfig::default(), |_attempt| async {
//!     Ok::<_, std::io::Error>("success")
//! }, |_err| true).await;
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every retry
    Fixed {
        /// Delay before each retry
        #[serde(with = "millis")]
        delay: Duration,
    },
    /// Delay grows by `multiplier` after each retry, capped at `max`
    Exponential {
        /// Delay before the first retry
        #[serde(with = "millis")]
        initial: Duration,
        /// Upper bound for any single delay
        #[serde(with = "millis")]
        max: Duration,
        /// Growth factor between consecutive retries
        multiplier: f64,
    },
}

impl Backoff {
    /// Base delay (without jitter) before the given retry, 1-based
    pub fn base_delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        match *self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
                let secs = initial.as_secs_f64() * multiplier.powi(exponent);
                if secs.is_nan() {
                    return Duration::ZERO;
                }
                Duration::from_secs_f64(secs.clamp(0.0, max.as_secs_f64()))
            }
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    pub max_retries: u32,
    /// Delay schedule
    pub backoff: Backoff,
    /// Add up to 25% random jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(250),
                max: Duration::from_secs(5),
                multiplier: 2.0,
            },
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a config for quick retries
    pub fn quick() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(50),
                max: Duration::from_millis(500),
                multiplier: 2.0,
            },
            jitter: true,
        }
    }

    /// Create a config for patient retries
    pub fn patient() -> Self {
        Self {
            max_retries: 4,
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(500),
                max: Duration::from_secs(30),
                multiplier: 2.0,
            },
            jitter: true,
        }
    }

    /// Create a config retrying `max_retries` times with a constant delay
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            jitter: false,
        }
    }

    /// Create a config with no retries
    pub fn no_retry() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    /// Reject schedules that cannot produce sensible delays
    pub fn validate(&self) -> crate::Result<()> {
        if let Backoff::Exponential {
            initial,
            max,
            multiplier,
        } = self.backoff
        {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(crate::Error::invalid(format!(
                    "retry multiplier must be a finite number of at least 1, got {multiplier}"
                )));
            }
            if initial > max {
                return Err(crate::Error::invalid(format!(
                    "initial retry delay {}ms exceeds the maximum of {}ms",
                    initial.as_millis(),
                    max.as_millis()
                )));
            }
        }
        Ok(())
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calculate delay before a given retry (1-based; 0 means first attempt)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let base = self.backoff.base_delay(retry);
        if self.jitter && !base.is_zero() {
            base.mul_f64(1.0 + rand_simple() * 0.25)
        } else {
            base
        }
    }
}

/// Simple pseudo-random number generator (0.0 to 1.0)
fn rand_simple() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u32(nanos);
    (hasher.finish() % 1000) as f64 / 1000.0
}

/// Retry result with attempt information
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub value: T,
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent, including delays
    pub total_duration: Duration,
}

/// Failure after one or more attempts
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// The last error observed
    pub error: E,
    /// Number of attempts made
    pub attempts: u32,
    /// The last error was retryable but the retry budget ran out
    pub exhausted: bool,
}

/// Execute an async operation with retry logic
///
/// `operation` receives the 1-based attempt number. `should_retry` decides
/// whether an error is transient; a non-retryable error stops immediately.
pub async fn retry_async<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: P,
) -> Result<RetryResult<T>, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let start = Instant::now();
    let max_attempts = config.max_attempts();
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return Ok(RetryResult {
                    value,
                    attempts: attempt,
                    total_duration: start.elapsed(),
                });
            }
            Err(error) => {
                let retryable = should_retry(&error);
                if !retryable || attempt >= max_attempts {
                    return Err(RetryFailure {
                        error,
                        attempts: attempt,
                        exhausted: retryable,
                    });
                }

                let delay = config.delay_for_retry(attempt);
                debug!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
