//! Shared utilities for the CozyCampus client toolkit
//!
//! This crate provides functionality used by the API client and the CLI:
//!
//! - **Error handling**: Configuration errors with the offending path and a recovery suggestion
//! - **Retry**: Composable async retry with fixed or exponential backoff
//! - **Configuration**: TOML configuration file discovery and parsing
//!
//! # Example
//!
//! ```rust,no_run
//! use cozycampus_core::retry::{retry_async, RetryConfig};
//!
//! # async fn run() -> Result<(), std::io::Error> {
//! let outcome = retry_async(
//!     &RetryConfig::quick(),
//!     |_attempt| async { Ok::<_, std::io::Error>(42) },
//!     |_err| true,
//! )
//! .await
//! .map_err(|failure| failure.error)?;
//! assert_eq!(outcome.value, 42);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod retry;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{find_config_file, load_toml, ConfigFile};
    pub use crate::error::{Error, Result};
    pub use crate::retry::{retry_async, Backoff, RetryConfig, RetryFailure, RetryResult};
}
