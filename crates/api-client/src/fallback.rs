//! Development-mode placeholder data
//!
//! When the backend is down during local development, a few operations
//! (join, leave, event creation) can answer with synthesized records so the
//! rest of the flow stays usable. Synthesized records get negative ids.

use crate::config::FallbackMode;
use crate::error::{ApiError, ApiResult};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Placeholder policy shared by all clones of a client
#[derive(Debug, Clone)]
pub struct Fallback {
    mode: FallbackMode,
    next_id: Arc<AtomicI64>,
}

impl Fallback {
    /// Create a policy for `mode`
    #[must_use]
    pub fn new(mode: FallbackMode) -> Self {
        Self {
            mode,
            next_id: Arc::new(AtomicI64::new(-1)),
        }
    }

    /// Configured mode
    #[must_use]
    pub fn mode(&self) -> FallbackMode {
        self.mode
    }

    /// Whether placeholder data may be synthesized
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.mode == FallbackMode::Development
    }

    /// Next placeholder id: -1, -2, ...
    pub fn placeholder_id(&self) -> i64 {
        self.next_id.fetch_sub(1, Ordering::SeqCst)
    }

    /// Pass `result` through, or replace a failure with synthesized data
    ///
    /// Session expiry and client-side validation failures are never masked.
    pub fn recover<T, F>(&self, operation: &str, result: ApiResult<T>, synthesize: F) -> ApiResult<T>
    where
        F: FnOnce(i64) -> T,
    {
        match result {
            Ok(value) => Ok(value),
            Err(error @ (ApiError::Unauthorized | ApiError::Validation(_))) => Err(error),
            Err(error) if self.is_enabled() => {
                let id = self.placeholder_id();
                warn!(
                    operation = operation,
                    error = %error,
                    placeholder_id = id,
                    "Backend call failed, using development placeholder"
                );
                Ok(synthesize(id))
            }
            Err(error) => Err(error),
        }
    }
}

impl Default for Fallback {
    fn default() -> Self {
        Self::new(FallbackMode::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_passes_error_through() {
        let fallback = Fallback::default();
        let result = fallback.recover("join", Err::<i64, _>(ApiError::api_response(500, "")), |id| id);
        assert!(matches!(result, Err(ApiError::ApiResponse { status: 500, .. })));
    }

    #[test]
    fn test_development_synthesizes_negative_ids() {
        let fallback = Fallback::new(FallbackMode::Development);
        let first = fallback
            .recover("join", Err(ApiError::Network("down".into())), |id| id)
            .unwrap();
        let second = fallback
            .recover("join", Err(ApiError::Network("down".into())), |id| id)
            .unwrap();

        assert_eq!(first, -1);
        assert_eq!(second, -2);
    }

    #[test]
    fn test_never_masks_unauthorized_or_validation() {
        let fallback = Fallback::new(FallbackMode::Development);
        assert!(fallback
            .recover("join", Err::<i64, _>(ApiError::Unauthorized), |id| id)
            .is_err());
        assert!(fallback
            .recover("create", Err::<i64, _>(ApiError::validation("title")), |id| id)
            .is_err());
    }

    #[test]
    fn test_success_untouched() {
        let fallback = Fallback::new(FallbackMode::Development);
        assert_eq!(fallback.recover("leave", Ok(7), |id| id).unwrap(), 7);
        assert_eq!(fallback.placeholder_id(), -1);
    }
}
