//! Event and club event endpoints
//!
//! Campus events live under `/events`; club events under `/clubs/events`.
//! Both share one record shape and one set of operations, so a single
//! [`EventsApi`] serves both, scoped at construction.

use super::{fetch_list, recover_list, require_positive, Participant};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::status::EventStatus;
use crate::sync::Keyed;
use crate::transport::FileUpload;
use crate::wire::{self, null_default};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Which event collection an [`EventsApi`] addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    /// `/events`
    Campus,
    /// `/clubs/events`
    Club,
}

impl EventScope {
    fn base(self) -> &'static str {
        match self {
            Self::Campus => "events",
            Self::Club => "clubs/events",
        }
    }
}

/// Events API interface
#[derive(Clone)]
pub struct EventsApi {
    client: CampusClient,
    scope: EventScope,
}

/// Club events use the same interface, scoped to `/clubs/events`
pub type ClubEventsApi = EventsApi;

impl EventsApi {
    /// Campus events
    pub(crate) fn new(client: CampusClient) -> Self {
        Self {
            client,
            scope: EventScope::Campus,
        }
    }

    /// Club events
    pub(crate) fn club(client: CampusClient) -> Self {
        Self {
            client,
            scope: EventScope::Club,
        }
    }

    /// Collection this interface addresses
    #[must_use]
    pub fn scope(&self) -> EventScope {
        self.scope
    }

    fn request(&self, method: reqwest::Method) -> ApiRequest {
        ApiRequest::new(method, self.scope.base())
    }

    /// List all events
    ///
    /// GET /events
    pub async fn list(&self) -> Vec<Event> {
        let result = fetch_list(&self.client, self.request(reqwest::Method::GET)).await;
        recover_list("events.list", result)
    }

    /// Search events by free text
    ///
    /// GET /events/search?search=<term>
    pub async fn search(&self, term: &str) -> Vec<Event> {
        let request = self
            .request(reqwest::Method::GET)
            .segment("search")
            .query("search", term);
        recover_list("events.search", fetch_list(&self.client, request).await)
    }

    /// Events of one club
    ///
    /// GET /clubs/events/club/<clubId>
    pub async fn for_club(&self, club_id: i64) -> Vec<Event> {
        let request = ApiRequest::get("clubs/events/club").segment(club_id);
        recover_list("events.for_club", fetch_list(&self.client, request).await)
    }

    /// Get one event
    ///
    /// GET /events/<id>
    pub async fn get(&self, id: i64) -> ApiResult<Event> {
        self.client
            .execute(self.request(reqwest::Method::GET).segment(id))
            .await
    }

    /// Create an event
    ///
    /// Missing fields default to empty text, a start of now, an end one hour
    /// after the start, and the upcoming status. Club events require a club id.
    ///
    /// POST /events/create?createurId=<id>
    /// POST /clubs/events/club/<clubId>?createurId=<id>
    pub async fn create(&self, creator_id: i64, draft: EventDraft) -> ApiResult<Event> {
        let event = draft.resolve(Utc::now());

        let request = match self.scope {
            EventScope::Campus => ApiRequest::post("events/create"),
            EventScope::Club => {
                let club_id = event
                    .club_id
                    .ok_or_else(|| ApiError::validation("a club event needs a club id"))?;
                ApiRequest::post("clubs/events/club").segment(club_id)
            }
        }
        .query("createurId", creator_id)
        .json(&event)?;

        let result = self.client.execute::<Event>(request).await;
        let created = self.client.fallback().recover("events.create", result, |id| Event {
            id: Some(id),
            creator_id: Some(creator_id),
            ..event.clone()
        })?;

        info!(event = ?created.key(), title = %created.title, "Event created");
        Ok(created)
    }

    /// Update an event; only the fields set in `patch` are sent
    ///
    /// PUT /events/<id>?createurId=<id>
    pub async fn update(&self, id: i64, patch: &EventDraft, creator_id: i64) -> ApiResult<Event> {
        let request = self
            .request(reqwest::Method::PUT)
            .segment(id)
            .query("createurId", creator_id)
            .json(patch)?;
        self.client.execute(request).await
    }

    /// Move an event to another status after checking the transition locally
    pub async fn transition(&self, id: i64, to: EventStatus, creator_id: i64) -> ApiResult<Event> {
        let current = self.get(id).await?;
        if !current.status.can_transition_to(to) {
            return Err(ApiError::validation(format!(
                "an event cannot go from {} to {}",
                current.status, to
            )));
        }

        debug!(event = id, from = %current.status, to = %to, "Changing event status");
        let patch = EventDraft {
            status: Some(to),
            club_id: current.club_id,
            ..EventDraft::default()
        };
        self.update(id, &patch, creator_id).await
    }

    /// Delete an event
    ///
    /// DELETE /events/<id>?createurId=<id>
    pub async fn delete(&self, id: i64, creator_id: i64) -> ApiResult<()> {
        let request = self
            .request(reqwest::Method::DELETE)
            .segment(id)
            .query("createurId", creator_id);
        self.client.execute_unit(request).await
    }

    /// Participants of an event
    ///
    /// GET /events/<id>/participants
    pub async fn participants(&self, id: i64) -> Vec<Participant> {
        let request = self
            .request(reqwest::Method::GET)
            .segment(id)
            .segment("participants");
        recover_list("events.participants", fetch_list(&self.client, request).await)
    }

    /// Upload the event image and return its URL
    ///
    /// POST /events/<id>/upload (multipart)
    pub async fn upload_image(&self, id: i64, file: FileUpload) -> ApiResult<String> {
        require_positive("event", id)?;
        let request = self
            .request(reqwest::Method::POST)
            .segment(id)
            .segment("upload")
            .file(file);
        self.client.execute_upload(request).await
    }

    /// Remove the event image
    ///
    /// DELETE /events/<id>/image
    pub async fn remove_image(&self, id: i64) -> ApiResult<()> {
        require_positive("event", id)?;
        let request = self
            .request(reqwest::Method::DELETE)
            .segment(id)
            .segment("image");
        self.client.execute_unit(request).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// An event as returned by the backend
///
/// Depending on the endpoint the identifier arrives as `id`, `eventId` or
/// `eventClubId`; [`Event::key`] picks whichever is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Generic id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Campus event id, as sent by the events service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    /// Club event id, as sent by the club events service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_club_id: Option<i64>,
    /// Title
    #[serde(rename = "titre", default, deserialize_with = "null_default")]
    pub title: String,
    /// Free text description
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    /// Where the event takes place
    #[serde(rename = "lieu", default, deserialize_with = "null_default")]
    pub venue: String,
    /// Start time
    #[serde(rename = "dateDebut", default, with = "wire::timestamp")]
    pub start: Option<DateTime<Utc>>,
    /// End time
    #[serde(rename = "dateFin", default, with = "wire::timestamp")]
    pub end: Option<DateTime<Utc>>,
    /// Lifecycle status
    #[serde(default)]
    pub status: EventStatus,
    /// Number of enrolled users (zero when the backend sends null)
    #[serde(rename = "nbParticipants", default, deserialize_with = "null_default")]
    pub participant_count: u32,
    /// User who created the event
    #[serde(rename = "createurId", default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<i64>,
    /// Owning club, for club events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club_id: Option<i64>,
    /// Owning club name, for club events
    #[serde(
        rename = "nomClub",
        alias = "clubNom",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub club_name: Option<String>,
    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Event {
    /// Identifier, whichever field carried it
    #[must_use]
    pub fn key(&self) -> Option<i64> {
        self.event_club_id.or(self.event_id).or(self.id)
    }

    /// Whether the id was synthesized by the development fallback
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.key().is_some_and(|id| id < 0)
    }
}

impl Keyed for Event {
    fn key(&self) -> Option<i64> {
        Event::key(self)
    }
}

/// Fields for creating or patching an event
///
/// Unset fields are omitted from update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    /// Title
    #[serde(rename = "titre", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the event takes place
    #[serde(rename = "lieu", skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// Start time; defaults to now
    #[serde(
        rename = "dateDebut",
        default,
        with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<DateTime<Utc>>,
    /// End time; defaults to one hour after the start
    #[serde(
        rename = "dateFin",
        default,
        with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<DateTime<Utc>>,
    /// Lifecycle status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    /// Owning club; required for club events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<i64>,
    /// Owning club name, for club events
    #[serde(rename = "nomClub", skip_serializing_if = "Option::is_none")]
    pub club_name: Option<String>,
    /// Image URL returned by an earlier upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl EventDraft {
    /// Draft with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the venue
    #[must_use]
    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    /// Set start and end
    #[must_use]
    pub fn with_schedule(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Attach to a club
    #[must_use]
    pub fn with_club(mut self, club_id: i64) -> Self {
        self.club_id = Some(club_id);
        self
    }

    /// Fill defaults for creation
    pub(crate) fn resolve(self, now: DateTime<Utc>) -> Event {
        let start = self.start.unwrap_or(now);
        let end = self.end.unwrap_or(start + Duration::hours(1));

        Event {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            venue: self.venue.unwrap_or_default(),
            start: Some(start),
            end: Some(end),
            status: self.status.unwrap_or_default(),
            club_id: self.club_id,
            club_name: self.club_name,
            image: self.image,
            ..Event::default()
        }
    }
}
