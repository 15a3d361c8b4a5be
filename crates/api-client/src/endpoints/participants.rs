//! Event participation endpoints
//!
//! Campus events are joined through `/participants`, club events through
//! `/participantsClub`. The two services differ only in their base path,
//! the name of the event query parameter and the participant list path.

use super::{fetch_list, recover_list, Event, UserSummary};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::status::ParticipantStatus;
use crate::sync::Keyed;
use crate::wire;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Which participation service a [`ParticipantsApi`] addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationScope {
    /// `/participants`, keyed by `eventId`
    Events,
    /// `/participantsClub`, keyed by `eventClubId`
    ClubEvents,
}

impl ParticipationScope {
    fn base(self) -> &'static str {
        match self {
            Self::Events => "participants",
            Self::ClubEvents => "participantsClub",
        }
    }

    fn event_param(self) -> &'static str {
        match self {
            Self::Events => "eventId",
            Self::ClubEvents => "eventClubId",
        }
    }

    fn event_segment(self) -> &'static str {
        match self {
            Self::Events => "event",
            Self::ClubEvents => "eventClub",
        }
    }

    fn events_base(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::ClubEvents => "clubs/events",
        }
    }
}

/// Participants API interface
#[derive(Clone)]
pub struct ParticipantsApi {
    client: CampusClient,
    scope: ParticipationScope,
}

/// Club event participation uses the same interface, scoped to `/participantsClub`
pub type ClubParticipantsApi = ParticipantsApi;

impl ParticipantsApi {
    /// Campus event participation
    pub(crate) fn events(client: CampusClient) -> Self {
        Self {
            client,
            scope: ParticipationScope::Events,
        }
    }

    /// Club event participation
    pub(crate) fn club_events(client: CampusClient) -> Self {
        Self {
            client,
            scope: ParticipationScope::ClubEvents,
        }
    }

    /// Service this interface addresses
    #[must_use]
    pub fn scope(&self) -> ParticipationScope {
        self.scope
    }

    fn enrollment(&self, method: reqwest::Method, action: &str, user_id: i64, event_id: i64) -> ApiRequest {
        ApiRequest::new(method, self.scope.base())
            .segment(action)
            .query("userId", user_id)
            .query(self.scope.event_param(), event_id)
    }

    /// Join an event
    ///
    /// POST /participants/join?userId=<u>&eventId=<e>
    pub async fn join(&self, user_id: i64, event_id: i64) -> ApiResult<Participant> {
        let request = self.enrollment(reqwest::Method::POST, "join", user_id, event_id);
        let result = self.client.execute::<Participant>(request).await;

        let scope = self.scope;
        let participant = self.client.fallback().recover("participants.join", result, |id| {
            Participant::placeholder(id, user_id, event_id, scope)
        })?;

        info!(user = user_id, event = event_id, "Joined event");
        Ok(participant)
    }

    /// Leave an event
    ///
    /// DELETE /participants/leave?userId=<u>&eventId=<e>
    pub async fn leave(&self, user_id: i64, event_id: i64) -> ApiResult<()> {
        let request = self.enrollment(reqwest::Method::DELETE, "leave", user_id, event_id);
        let result = self.client.execute_unit(request).await;
        self.client
            .fallback()
            .recover("participants.leave", result, |_| ())?;

        info!(user = user_id, event = event_id, "Left event");
        Ok(())
    }

    /// Whether the user takes part in the event; `false` when unknown
    pub async fn is_participating(&self, user_id: i64, event_id: i64) -> bool {
        self.user_events(user_id)
            .await
            .iter()
            .any(|event| event.key() == Some(event_id))
    }

    /// Participants of an event
    ///
    /// GET /participants/event/<id>, then GET /events/<id>/participants.
    /// A 401 on the first route ends the call.
    pub async fn event_participants(&self, event_id: i64) -> Vec<Participant> {
        let primary = ApiRequest::get(self.scope.base())
            .segment(self.scope.event_segment())
            .segment(event_id);

        let result = match fetch_list(&self.client, primary).await {
            Ok(participants) => Ok(participants),
            Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
            Err(error) => {
                debug!(error = %error, "Primary participant listing failed, trying event route");
                let alternative = ApiRequest::get(self.scope.events_base())
                    .segment(event_id)
                    .segment("participants");
                fetch_list(&self.client, alternative).await
            }
        };

        recover_list("participants.event_participants", result)
    }

    /// Events the user takes part in
    ///
    /// GET /participants/user/<id>, then GET /users/<id>/events for campus
    /// events. A 401 on the first route ends the call.
    pub async fn user_events(&self, user_id: i64) -> Vec<Event> {
        let primary = ApiRequest::get(self.scope.base())
            .segment("user")
            .segment(user_id);

        let result = match (fetch_list(&self.client, primary).await, self.scope) {
            (Ok(events), _) => Ok(events),
            (Err(ApiError::Unauthorized), _) => Err(ApiError::Unauthorized),
            (Err(error), ParticipationScope::Events) => {
                debug!(error = %error, "Primary user event listing failed, trying user route");
                let alternative = ApiRequest::get("users").segment(user_id).segment("events");
                fetch_list(&self.client, alternative).await
            }
            (Err(error), ParticipationScope::ClubEvents) => Err(error),
        };

        recover_list("participants.user_events", result)
    }

    /// Change a participant's status
    ///
    /// PUT /participants/status?userId=<u>&eventId=<e>&status=<s>
    pub async fn update_status(
        &self,
        user_id: i64,
        event_id: i64,
        status: ParticipantStatus,
    ) -> ApiResult<Participant> {
        let request = self
            .enrollment(reqwest::Method::PUT, "status", user_id, event_id)
            .query("status", status);
        self.client.execute(request).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// An enrollment of a user in an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Enrollment id; negative for a development placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Enrolled user
    #[serde(default, deserialize_with = "wire::null_default")]
    pub user_id: i64,
    /// Campus event id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    /// Club event id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_club_id: Option<i64>,
    /// Nested event, when the backend embeds it
    #[serde(alias = "eventClub", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    /// When the user signed up
    #[serde(rename = "dateInscription", default, with = "wire::timestamp")]
    pub enrolled_at: Option<DateTime<Utc>>,
    /// Enrollment status
    #[serde(default)]
    pub status: ParticipantStatus,
    /// Given name, when flattened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name, when flattened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Contact email, when flattened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Nested user, when the backend embeds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl Participant {
    /// Event this enrollment refers to
    #[must_use]
    pub fn event_key(&self) -> Option<i64> {
        self.event_id
            .or(self.event_club_id)
            .or_else(|| self.event.as_ref().and_then(Event::key))
    }

    /// Name to display, from the flat fields or the nested user
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let (first, last) = match &self.user {
            Some(user) if self.first_name.is_none() && self.last_name.is_none() => {
                (user.first_name.as_deref(), user.last_name.as_deref())
            }
            _ => (self.first_name.as_deref(), self.last_name.as_deref()),
        };

        let name = [first, last].into_iter().flatten().collect::<Vec<_>>().join(" ");
        (!name.is_empty()).then_some(name)
    }

    fn placeholder(id: i64, user_id: i64, event_id: i64, scope: ParticipationScope) -> Self {
        let (event_id, event_club_id) = match scope {
            ParticipationScope::Events => (Some(event_id), None),
            ParticipationScope::ClubEvents => (None, Some(event_id)),
        };

        Self {
            id: Some(id),
            user_id,
            event_id,
            event_club_id,
            enrolled_at: Some(Utc::now()),
            status: ParticipantStatus::Confirmed,
            ..Self::default()
        }
    }
}

impl Keyed for Participant {
    fn key(&self) -> Option<i64> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{scripted, scripted_with};
    use crate::config::{ClientConfig, Environment, FallbackMode};
    use crate::session::Session;
    use crate::testing::{RecordingListener, ScriptedTransport};
    use std::sync::Arc;
    use serde_json::json;

    fn dev_config() -> ClientConfig {
        ClientConfig {
            environment: Environment::Development,
            fallback: FallbackMode::Development,
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_join_sends_query() {
        let (client, transport) = scripted(ScriptedTransport::new().push_json(
            200,
            json!({"id": 1, "userId": 7, "eventId": 42, "status": "CONFIRMED"}),
        ));

        let participant = client.participants().join(7, 42).await.unwrap();
        assert_eq!(participant.event_key(), Some(42));
        assert_eq!(participant.status, ParticipantStatus::Confirmed);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.path(), "/api/participants/join");
        assert_eq!(request.query_param("userId").as_deref(), Some("7"));
        assert_eq!(request.query_param("eventId").as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_club_scope_uses_event_club_param() {
        let (client, transport) = scripted(ScriptedTransport::new().push_json(
            200,
            json!({"id": 2, "userId": 7, "eventClub": {"eventClubId": 8}}),
        ));

        let participant = client.club_participants().join(7, 8).await.unwrap();
        assert_eq!(participant.event_key(), Some(8));

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.path(), "/api/participantsClub/join");
        assert_eq!(request.query_param("eventClubId").as_deref(), Some("8"));
    }

    #[tokio::test]
    async fn test_join_failure_without_fallback() {
        let (client, _) = scripted(ScriptedTransport::new());
        let err = client.participants().join(7, 42).await.unwrap_err();
        assert!(err.is_network() || matches!(err, ApiError::RetriesExhausted { .. }));
    }

    #[tokio::test]
    async fn test_development_fallback_synthesizes() {
        let (client, _) = scripted_with(dev_config(), ScriptedTransport::new());

        let participant = client.participants().join(7, 42).await.unwrap();
        assert!(participant.id.unwrap() < 0);
        assert_eq!(participant.event_key(), Some(42));
        assert_eq!(participant.status, ParticipantStatus::Confirmed);

        assert!(client.participants().leave(7, 42).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_events_falls_back_to_user_route() {
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_text(404, "")
                .push_json(200, json!([{"id": 42}, {"id": 43}])),
        );

        assert!(client.participants().is_participating(7, 43).await);
        assert_eq!(transport.last_request().unwrap().url.path(), "/api/users/7/events");
    }

    #[tokio::test]
    async fn test_user_events_empty_on_failure() {
        let (client, _) = scripted(ScriptedTransport::new());
        assert!(client.participants().user_events(7).await.is_empty());
        assert!(!client.club_participants().is_participating(7, 1).await);
    }

    #[tokio::test]
    async fn test_unauthorized_skips_alternative_routes() {
        let listener = Arc::new(RecordingListener::default());
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_text(401, "")
                .push_text(401, "")
                .push_text(401, ""),
        );
        let client = client.with_session(
            Session::new("/auth")
                .with_token("stale")
                .with_listener(listener.clone()),
        );

        assert!(client.participants().user_events(7).await.is_empty());
        assert_eq!(transport.request_count(), 1);
        assert_eq!(listener.expirations(), 1);

        client.session().set_token("again");
        assert!(client.participants().event_participants(42).await.is_empty());
        assert_eq!(transport.request_count(), 2);
        assert_eq!(listener.expirations(), 2);
    }

    #[tokio::test]
    async fn test_event_participants_alternative_route() {
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_text(404, "")
                .push_json(200, json!([{"id": 1, "userId": 3, "firstName": "Lina"}])),
        );

        let participants = client.club_participants().event_participants(8).await;
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].display_name().as_deref(), Some("Lina"));
        assert_eq!(
            transport.last_request().unwrap().url.path(),
            "/api/clubs/events/8/participants"
        );
    }

    #[tokio::test]
    async fn test_update_status_query() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(200, json!({"id": 1, "userId": 7, "status": "CANCELLED"})),
        );

        let participant = client
            .participants()
            .update_status(7, 42, ParticipantStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(participant.status, ParticipantStatus::Cancelled);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.path(), "/api/participants/status");
        assert_eq!(request.query_param("status").as_deref(), Some("CANCELLED"));
    }
}
