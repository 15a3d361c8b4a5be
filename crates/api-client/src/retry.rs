//! Retry policies for backend requests
//!
//! A [`RetryPolicy`] pairs the backoff schedule from `cozycampus-core` with a
//! predicate deciding which [`ApiError`]s are transient. The client applies
//! one policy to every request; individual operations may override it.

use crate::error::ApiError;
use cozycampus_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which failures are retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    /// Network failures, timeouts, 429 and any 5xx
    Transient,
    /// Any 5xx response
    ServerErrors,
    /// Only the listed HTTP statuses
    Statuses(Vec<u16>),
    /// Never retry
    Never,
}

impl RetryOn {
    /// Whether `error` should be retried under this predicate
    #[must_use]
    pub fn matches(&self, error: &ApiError) -> bool {
        match self {
            Self::Transient => error.is_retryable(),
            Self::ServerErrors => {
                matches!(error, ApiError::ApiResponse { status, .. } if *status >= 500)
            }
            Self::Statuses(statuses) => {
                matches!(error, ApiError::ApiResponse { status, .. } if statuses.contains(status))
            }
            Self::Never => false,
        }
    }
}

/// Backoff schedule plus retryable-error predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempt budget and delays
    #[serde(flatten)]
    pub config: RetryConfig,
    /// Which errors are retried
    pub retry_on: RetryOn,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            config: RetryConfig::default(),
            retry_on: RetryOn::Transient,
        }
    }
}

impl RetryPolicy {
    /// Short delays, suited to a local backend
    #[must_use]
    pub fn quick() -> Self {
        Self {
            config: RetryConfig::quick(),
            retry_on: RetryOn::Transient,
        }
    }

    /// Longer delays and a larger budget
    #[must_use]
    pub fn patient() -> Self {
        Self {
            config: RetryConfig::patient(),
            retry_on: RetryOn::Transient,
        }
    }

    /// Single attempt
    #[must_use]
    pub fn none() -> Self {
        Self {
            config: RetryConfig::no_retry(),
            retry_on: RetryOn::Never,
        }
    }

    /// Policy for posting comments: up to two retries, 3 seconds apart, on HTTP 500
    #[must_use]
    pub fn comment_submission() -> Self {
        Self {
            config: RetryConfig::fixed(2, Duration::from_secs(3)),
            retry_on: RetryOn::Statuses(vec![500]),
        }
    }

    /// Replace the attempt budget and delays, keeping the predicate
    #[must_use]
    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether `error` should be retried
    #[must_use]
    pub fn should_retry(&self, error: &ApiError) -> bool {
        self.retry_on.matches(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_policy_only_retries_500() {
        let policy = RetryPolicy::comment_submission();
        assert_eq!(policy.config.max_retries, 2);
        assert!(policy.should_retry(&ApiError::api_response(500, "")));
        assert!(!policy.should_retry(&ApiError::api_response(503, "")));
        assert!(!policy.should_retry(&ApiError::Network("reset".into())));
    }

    #[test]
    fn test_server_errors_predicate() {
        let retry_on = RetryOn::ServerErrors;
        assert!(retry_on.matches(&ApiError::api_response(502, "")));
        assert!(!retry_on.matches(&ApiError::api_response(429, "")));
        assert!(!retry_on.matches(&ApiError::Unauthorized));
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: RetryPolicy = toml::from_str(
            r#"
            max_retries = 1
            jitter = false
            retry_on = { statuses = [502, 503] }

            [backoff]
            kind = "fixed"
            delay = 10
            "#,
        )
        .unwrap();

        assert_eq!(policy.config.max_attempts(), 2);
        assert!(policy.should_retry(&ApiError::api_response(503, "")));
        assert!(!policy.should_retry(&ApiError::api_response(500, "")));
    }
}
