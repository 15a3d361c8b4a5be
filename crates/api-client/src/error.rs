//! Error types for the API client

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Request(#[from] reqwest::Error),

    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// Request timeout
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// The backend answered 401; the stored token has been cleared
    #[error("Session expired - please sign in again")]
    Unauthorized,

    /// Refused on the client side before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// The response body matched none of the known shapes
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// All retry attempts exhausted
    #[error("All {attempts} attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error returned by the final attempt
        #[source]
        last_error: Box<ApiError>,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a client-side validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiResponse { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// The error that ended the request
    ///
    /// For [`ApiError::RetriesExhausted`] this is the final attempt's error,
    /// so callers can still match on its status.
    #[must_use]
    pub fn root(&self) -> &ApiError {
        match self {
            Self::RetriesExhausted { last_error, .. } => last_error.root(),
            other => other,
        }
    }

    /// Whether no response was received at all (network failure or timeout)
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// Check if this error is worth retrying under the default policy
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::Request(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Unauthorized
            | Self::Validation(_)
            | Self::UnexpectedShape(_)
            | Self::RetriesExhausted { .. }
            | Self::InvalidUrl(_) => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(status) if (400..500).contains(&status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(status) if status >= 500)
    }

    /// Message suitable for showing to an end user
    ///
    /// Prefers the server-supplied message; otherwise a static message for
    /// the error class.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiResponse { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::ApiResponse { status: 400, .. } => {
                "Invalid request. Please check the data you provided.".to_string()
            }
            Self::ApiResponse { status: 403, .. } => {
                "You do not have permission to perform this action.".to_string()
            }
            Self::ApiResponse { status: 404, .. } => {
                "The requested resource was not found.".to_string()
            }
            Self::ApiResponse { status, .. } if *status >= 500 => {
                "The service is temporarily unavailable. Please try again later.".to_string()
            }
            Self::ApiResponse { status, .. } => format!("The request failed (HTTP {status})."),
            Self::Network(_) | Self::Timeout(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Validation(message) => message.clone(),
            Self::RetriesExhausted { .. } => {
                "Maximum number of attempts reached. Please try again later.".to_string()
            }
            Self::Request(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::UnexpectedShape(_)
            | Self::InvalidUrl(_) => "An unexpected error occurred.".to_string(),
        }
    }
}

/// Error context for better debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request ID for correlation
    pub request_id: Option<String>,
    /// Endpoint that was called
    pub endpoint: String,
    /// HTTP method used
    pub method: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        if let Some(ref id) = self.request_id {
            write!(f, " (request_id: {id})")?;
        }
        Ok(())
    }
}
