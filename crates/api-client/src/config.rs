//! Configuration for the CozyCampus API client
//!
//! One parameterized configuration replaces the per-copy hardcoded base URLs,
//! timeouts and development switches. Settings come from defaults, an
//! optional TOML file, and `COZYCAMPUS_*` environment variables, in that
//! order of precedence (later wins).

use crate::error::{ApiError, ApiResult};
use crate::retry::RetryPolicy;
use cozycampus_core::config::ConfigFile;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default backend URL (local Spring backend)
pub const DEFAULT_API_URL: &str = "http://localhost:9191/api";

/// Route the UI is sent to when the session expires
pub const DEFAULT_LOGIN_ROUTE: &str = "/auth";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse an environment name, defaulting to production
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }
}

/// What to do when a call that supports it fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Surface every failure
    #[default]
    Disabled,
    /// Return synthesized placeholder data for join/leave/create failures
    Development,
}

impl FallbackMode {
    /// Parse a fallback mode name; anything unrecognized disables fallback
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "on" | "true" | "1" => Self::Development,
            _ => Self::Disabled,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for the main backend (events, clubs, participants)
    pub base_url: String,
    /// Base URL for the forum service (posts, comments)
    pub forum_url: String,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Retry policy applied to every request unless overridden
    pub retry: RetryPolicy,
    /// Development-mode placeholder data
    pub fallback: FallbackMode,
    /// Current environment
    pub environment: Environment,
    /// Route reported to the session listener on 401
    pub login_route: String,
    /// Bearer token to start the session with
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            forum_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            fallback: FallbackMode::Disabled,
            environment: Environment::default(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            token: None,
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `COZYCAMPUS_API_URL`: Base URL for the main backend
    /// - `COZYCAMPUS_FORUM_URL`: Base URL for posts and comments (defaults to the API URL)
    /// - `COZYCAMPUS_ENV`: Environment (development/staging/production)
    /// - `COZYCAMPUS_TIMEOUT_SECS`: Request timeout in seconds
    /// - `COZYCAMPUS_FALLBACK`: `development` to enable placeholder data
    /// - `COZYCAMPUS_TOKEN`: Bearer token for the initial session
    pub fn from_env() -> ApiResult<Self> {
        Self::default().merge_vars(|key| env::var(key).ok())
    }

    /// Load a TOML file (explicit path or standard location), then apply environment overrides
    pub fn load(path: Option<&Path>) -> ApiResult<Self> {
        let file = ConfigFile::<Self>::load(path)
            .map_err(|e| ApiError::config(format!("{e}. {}", e.suggestion())))?;
        file.settings.merge_vars(|key| env::var(key).ok())
    }

    /// Apply `COZYCAMPUS_*` overrides from a variable lookup and validate
    pub fn merge_vars<F>(mut self, lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env_name) = lookup("COZYCAMPUS_ENV") {
            self.environment = Environment::parse(&env_name);
            if self.retry == RetryPolicy::default() {
                self.retry = match self.environment {
                    Environment::Development => RetryPolicy::quick(),
                    Environment::Staging => RetryPolicy::default(),
                    Environment::Production => RetryPolicy::patient(),
                };
            }
        }

        let forum_explicit = lookup("COZYCAMPUS_FORUM_URL");
        if let Some(url) = lookup("COZYCAMPUS_API_URL") {
            if forum_explicit.is_none() && self.forum_url == self.base_url {
                self.forum_url.clone_from(&url);
            }
            self.base_url = url;
        }
        if let Some(url) = forum_explicit {
            self.forum_url = url;
        }

        if let Some(raw) = lookup("COZYCAMPUS_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ApiError::config(format!("invalid COZYCAMPUS_TIMEOUT_SECS: {raw}")))?;
            self.timeout = Duration::from_secs(secs);
        }

        if let Some(mode) = lookup("COZYCAMPUS_FALLBACK") {
            self.fallback = FallbackMode::parse(&mode);
        }

        if let Some(token) = lookup("COZYCAMPUS_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }

        self.validate()?;
        Ok(self)
    }

    /// Create development configuration (local backend, placeholder data on)
    #[must_use]
    pub fn development() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            retry: RetryPolicy::quick(),
            fallback: FallbackMode::Development,
            environment: Environment::Development,
            ..Self::default()
        }
    }

    /// Create production configuration
    #[must_use]
    pub fn production(base_url: impl Into<String>) -> Self {
        Self::default()
            .with_base_url(base_url)
            .with_retry(RetryPolicy::patient())
    }

    /// Builder-style method to set base URL (the forum URL follows unless set separately)
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if self.forum_url == self.base_url {
            self.forum_url.clone_from(&url);
        }
        self.base_url = url;
        self
    }

    /// Builder-style method to set the forum service URL
    #[must_use]
    pub fn with_forum_url(mut self, url: impl Into<String>) -> Self {
        self.forum_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder-style method to set fallback mode
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackMode) -> Self {
        self.fallback = fallback;
        self
    }

    /// Builder-style method to set the initial token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        for (name, url) in [("base_url", &self.base_url), ("forum_url", &self.forum_url)] {
            if url.is_empty() {
                return Err(ApiError::config(format!("{name} cannot be empty")));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ApiError::config(format!(
                    "{name} must start with http:// or https://"
                )));
            }
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        self.retry
            .config
            .validate()
            .map_err(|e| ApiError::config(format!("{e}. {}", e.suggestion())))?;

        if self.fallback == FallbackMode::Development && self.environment == Environment::Production
        {
            return Err(ApiError::config(
                "placeholder fallback data cannot be enabled in production",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.forum_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.fallback, FallbackMode::Disabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_config() {
        let config = ClientConfig::development();
        assert!(config.base_url.contains("localhost"));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.fallback, FallbackMode::Development);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_base_url("https://campus.example.org/api")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "https://campus.example.org/api");
        assert_eq!(config.forum_url, "https://campus.example.org/api");
        assert_eq!(config.timeout, Duration::from_secs(60));

        let split = config.with_forum_url("http://localhost:8082/api");
        assert_eq!(split.forum_url, "http://localhost:8082/api");
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(ClientConfig::default()
            .with_base_url("ftp://campus")
            .validate()
            .is_err());
        assert!(ClientConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_fallback_rejected_in_production() {
        let config = ClientConfig::default().with_fallback(FallbackMode::Development);
        assert!(matches!(config.validate(), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_merge_vars() {
        let config = ClientConfig::default()
            .merge_vars(vars(&[
                ("COZYCAMPUS_ENV", "dev"),
                ("COZYCAMPUS_API_URL", "http://localhost:9000/api"),
                ("COZYCAMPUS_TIMEOUT_SECS", "12"),
                ("COZYCAMPUS_FALLBACK", "development"),
                ("COZYCAMPUS_TOKEN", "abc"),
            ]))
            .unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.forum_url, "http://localhost:9000/api");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.fallback, FallbackMode::Development);
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_environment_keeps_file_retry_policy() {
        let file: ClientConfig = toml::from_str(
            r#"
            [retry]
            max_retries = 0
            jitter = false
            retry_on = "never"

            [retry.backoff]
            kind = "fixed"
            delay = 0
            "#,
        )
        .unwrap();

        let config = file.merge_vars(vars(&[("COZYCAMPUS_ENV", "staging")])).unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.retry, RetryPolicy::none());

        let config = ClientConfig::default()
            .merge_vars(vars(&[("COZYCAMPUS_ENV", "production")]))
            .unwrap();
        assert_eq!(config.retry, RetryPolicy::patient());
    }

    #[test]
    fn test_negative_backoff_multiplier_rejected() {
        let config: ClientConfig = toml::from_str(
            r#"
            [retry]
            max_retries = 3
            jitter = false
            retry_on = "transient"

            [retry.backoff]
            kind = "exponential"
            initial = 100
            max = 1000
            multiplier = -2.0
            "#,
        )
        .unwrap();

        assert!(matches!(config.validate(), Err(ApiError::Config(_))));
        assert!(ClientConfig::default().merge_vars(vars(&[])).is_ok());
        assert!(config.merge_vars(vars(&[])).is_err());
    }

    #[test]
    fn test_merge_vars_rejects_bad_timeout() {
        let result = ClientConfig::default().merge_vars(vars(&[("COZYCAMPUS_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            base_url = "http://localhost:9191/api"
            forum_url = "http://localhost:8082/api"
            timeout = 15
            environment = "development"
            fallback = "development"
            "#,
        )
        .unwrap();

        assert_eq!(config.forum_url, "http://localhost:8082/api");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.login_route, DEFAULT_LOGIN_ROUTE);
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.validate().is_ok());
    }
}
