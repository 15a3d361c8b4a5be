//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one backend resource.
//!
//! ## Mapping to the CozyCampus backend
//!
//! | Module | Service | Base path |
//! |--------|---------|-----------|
//! | `auth` | api | `/auth` |
//! | `events` | api | `/events`, `/clubs/events` |
//! | `clubs` | api | `/clubs` |
//! | `members` | api | `/clubs/{id}/membres`, `/users/{id}` |
//! | `participants` | api | `/participants`, `/participantsClub` |
//! | `categories` | api | `/categories` |
//! | `posts` | forum | `/posts` |
//! | `comments` | forum | `/comments` |
//! | `reports` | forum | `/reports` |
//!
//! Listing operations never fail: any error is logged and an empty list is
//! returned. Everything else returns an [`ApiResult`].

pub mod auth;
pub mod categories;
pub mod clubs;
pub mod comments;
pub mod events;
pub mod members;
pub mod participants;
pub mod posts;
pub mod reports;

pub use auth::{AuthApi, AuthResponse, Registration};
pub use categories::{CategoriesApi, Category};
pub use clubs::{Club, ClubDraft, ClubsApi};
pub use comments::{Comment, CommentsApi};
pub use events::{ClubEventsApi, Event, EventDraft, EventsApi};
pub use members::{ClubMember, MembersApi, UserSummary};
pub use participants::{ClubParticipantsApi, Participant, ParticipantsApi};
pub use posts::{Post, PostDraft, PostsApi};
pub use reports::{Report, ReportsApi};

use crate::client::{ApiRequest, CampusClient};
use crate::envelope;
use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Fetch a list, accepting any of the known envelope shapes
pub(crate) async fn fetch_list<T: DeserializeOwned>(
    client: &CampusClient,
    request: ApiRequest,
) -> ApiResult<Vec<T>> {
    let body = client.execute_value(request).await?;
    envelope::normalize(body)
}

/// Collapse a failed listing into an empty list
pub(crate) fn recover_list<T>(operation: &str, result: ApiResult<Vec<T>>) -> Vec<T> {
    match result {
        Ok(items) => {
            debug!(operation = operation, count = items.len(), "Fetched list");
            items
        }
        Err(ApiError::Unauthorized) => {
            warn!(operation = operation, "Session expired while listing, returning empty list");
            Vec::new()
        }
        Err(error) => {
            warn!(operation = operation, error = %error, "Listing failed, returning empty list");
            Vec::new()
        }
    }
}

/// Reject ids that cannot exist on the backend
pub(crate) fn require_positive(what: &str, id: i64) -> ApiResult<()> {
    if id > 0 {
        Ok(())
    } else {
        Err(ApiError::validation(format!("invalid {what} id: {id}")))
    }
}
