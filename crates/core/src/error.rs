//! Errors raised while locating and reading configuration files

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum Error {
    /// An explicitly requested file does not exist
    #[error("configuration file not found: {}", path.display())]
    NotFound {
        /// Requested path
        path: PathBuf,
    },

    /// The file exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the expected settings
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Settings parsed but are not usable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Error {
    /// Build an [`Error::Invalid`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// File involved in the failure, if any
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::NotFound { path } | Self::Read { path, .. } | Self::Parse { path, .. } => {
                Some(path)
            }
            Self::Invalid(_) => None,
        }
    }

    /// What the user can do about it
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => {
                "Create a .cozycampus.toml file or pass --config with an existing path"
            }
            Self::Read { .. } => "Check the file permissions",
            Self::Parse { .. } => "Fix the TOML syntax or the value types in the file",
            Self::Invalid(_) => "Review the configuration values and environment variables",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_path() {
        let err = Error::NotFound {
            path: PathBuf::from("/etc/cozycampus.toml"),
        };
        assert!(err.to_string().contains("/etc/cozycampus.toml"));
        assert!(err.suggestion().contains("--config"));
    }

    #[test]
    fn test_read_error_keeps_source() {
        let err = Error::Read {
            path: PathBuf::from("cozycampus.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.path(), Some(std::path::Path::new("cozycampus.toml")));
    }

    #[test]
    fn test_invalid_has_no_path() {
        let err = Error::invalid("timeout must be positive");
        assert!(err.path().is_none());
        assert_eq!(err.to_string(), "invalid configuration: timeout must be positive");
    }
}
