//! Typed client for the CozyCampus backend
//!
//! One [`CampusClient`] owns the HTTP transport, configuration, session and
//! development fallback. Each backend resource (accounts, events, clubs,
//! members, participants, forum posts, comments and reports, categories) is
//! reached through a small per-resource interface borrowed from it.
//!
//! # Features
//!
//! - **Environment-based configuration**: URLs, timeout and token from `COZYCAMPUS_*` variables or a TOML file
//! - **Retry with exponential backoff**: transient failures are retried per request policy
//! - **Envelope normalization**: bare arrays, `content`, `events` and `eventsClubs` lists decode alike
//! - **Session handling**: token obtained at sign-in, attached to every call, cleared once on HTTP 401
//! - **Development fallback**: creates synthesize placeholder records when the backend is unreachable
//! - **Request correlation**: every request carries an `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use cozycampus_api_client::{CampusClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CampusClient::with_config(ClientConfig::from_env()?)?;
//!
//!     for event in client.events().list().await {
//!         println!("{} ({})", event.title, event.status);
//!     }
//!
//!     let comment = client.comments().create(7, 3, "Rendez-vous à 18h").await?;
//!     println!("Posted comment {:?}", comment.id);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod retry;
pub mod session;
pub mod status;
pub mod sync;
pub mod transport;
pub mod wire;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ApiRequest, CampusClient};
pub use config::{ClientConfig, Environment, FallbackMode};
pub use error::{ApiError, ApiResult};
pub use retry::{RetryOn, RetryPolicy};
pub use session::{MemoryTokenStore, Session, SessionListener, TokenStore};
pub use transport::{FileUpload, Transport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::CampusClient;
    pub use crate::config::{ClientConfig, Environment, FallbackMode};
    pub use crate::endpoints::{
        AuthApi, CategoriesApi, ClubEventsApi, ClubParticipantsApi, ClubsApi, CommentsApi,
        EventsApi, MembersApi, ParticipantsApi, PostsApi, ReportsApi,
    };
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::status::{ClubState, EventStatus, MemberRole, ParticipantStatus, ReportStatus};
    pub use crate::sync::{AttendingSet, Keyed, LocalCollection};
}
