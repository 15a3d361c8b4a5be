//! Club endpoints
//!
//! Clubs are proposed by students, moderated by administrators
//! (`EN_ATTENTE` to `ACCEPTER` or `REFUSER`) and only accepted clubs are
//! shown publicly.

use super::{fetch_list, recover_list, require_positive, Category, ClubMember};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::retry::RetryPolicy;
use crate::status::ClubState;
use crate::sync::Keyed;
use crate::transport::FileUpload;
use crate::wire::{self, null_default};
use chrono::{NaiveDate, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Messages the backend uses when a member is already gone
const ALREADY_REMOVED_MARKERS: &[&str] = &["n'existe pas", "not found", "introuvable"];

fn already_removed(error: &ApiError) -> bool {
    matches!(
        error,
        ApiError::ApiResponse { status: 500, message }
            if ALREADY_REMOVED_MARKERS.iter().any(|marker| message.contains(marker))
    )
}

/// Clubs API interface
#[derive(Clone)]
pub struct ClubsApi {
    client: CampusClient,
}

impl ClubsApi {
    /// Create a new clubs API interface
    pub(crate) fn new(client: CampusClient) -> Self {
        Self { client }
    }

    /// List clubs, optionally keeping only accepted ones
    ///
    /// GET /clubs
    pub async fn list(&self, public_only: bool) -> Vec<Club> {
        let clubs: Vec<Club> =
            recover_list("clubs.list", fetch_list(&self.client, ApiRequest::get("clubs")).await);

        if public_only {
            clubs
                .into_iter()
                .filter(|club| club.state == ClubState::Accepted)
                .collect()
        } else {
            clubs
        }
    }

    /// List clubs with their member count refreshed from the membership listing
    ///
    /// Counts are fetched concurrently; a club whose members cannot be
    /// listed keeps the count the backend reported.
    pub async fn list_with_member_counts(&self, public_only: bool) -> Vec<Club> {
        let clubs = self.list(public_only).await;
        join_all(clubs.into_iter().map(|mut club| async move {
            if let Some(id) = club.id {
                let request = ApiRequest::get("clubs").segment(id).segment("membres");
                match fetch_list::<ClubMember>(&self.client, request).await {
                    Ok(members) => club.member_count = members.len() as u32,
                    Err(error) => debug!(club = id, error = %error, "Keeping reported member count"),
                }
            }
            club
        }))
        .await
    }

    /// Get one club
    ///
    /// GET /clubs/<id>
    pub async fn get(&self, id: i64) -> ApiResult<Club> {
        self.client.execute(ApiRequest::get("clubs").segment(id)).await
    }

    /// Propose a new club
    ///
    /// Name, description and a positive category id are required. The
    /// creation date defaults to today.
    ///
    /// POST /clubs
    pub async fn create(&self, draft: ClubDraft) -> ApiResult<Club> {
        let payload = draft.into_create_request(Utc::now().date_naive())?;
        let club: Club = self
            .client
            .execute(ApiRequest::post("clubs").json(&payload)?)
            .await?;

        info!(club = ?club.id, name = %club.name, "Club proposed");
        Ok(club)
    }

    /// Update a club; only the fields set in `patch` are sent
    ///
    /// PUT /clubs/<id>
    pub async fn update(&self, id: i64, patch: &ClubDraft) -> ApiResult<Club> {
        let request = ApiRequest::put("clubs").segment(id).json(patch)?;
        self.client.execute(request).await
    }

    /// Delete a club
    ///
    /// When `requester` is given, the club is fetched first and deletion is
    /// refused unless the requester created it.
    ///
    /// DELETE /clubs/<id>
    pub async fn delete(&self, id: i64, requester: Option<i64>) -> ApiResult<()> {
        if let Some(user_id) = requester {
            let club = self.get(id).await?;
            if club.creator_id != Some(user_id) {
                return Err(ApiError::validation("only the club creator can delete it"));
            }
        }

        self.client
            .execute_unit(ApiRequest::delete("clubs").segment(id))
            .await
    }

    /// Join a club
    ///
    /// POST /clubs/<id>/inscription/<userId>
    pub async fn join(&self, club_id: i64, user_id: i64) -> ApiResult<()> {
        let request = ApiRequest::post("clubs")
            .segment(club_id)
            .segment("inscription")
            .segment(user_id);
        self.client.execute_unit(request).await
    }

    /// Leave a club
    ///
    /// DELETE /clubs/<id>/inscription/<userId>
    pub async fn leave(&self, club_id: i64, user_id: i64) -> ApiResult<()> {
        let request = ApiRequest::delete("clubs")
            .segment(club_id)
            .segment("inscription")
            .segment(user_id);
        self.client.execute_unit(request).await
    }

    /// Members of a club
    ///
    /// GET /clubs/<id>/membres
    pub async fn members(&self, club_id: i64) -> Vec<ClubMember> {
        self.client.members().list(club_id).await
    }

    /// Number of members of a club (zero when unknown)
    pub async fn member_count(&self, club_id: i64) -> usize {
        self.members(club_id).await.len()
    }

    /// Remove a member as a club administrator
    ///
    /// Refused without any request when the admin targets themselves or the
    /// club creator. Sent once: a server error saying the member is already
    /// gone counts as success.
    ///
    /// DELETE /clubs/<id>/membres/<memberId>?adminId=<adminId>
    pub async fn remove_member(&self, club: &Club, member_id: i64, admin_id: i64) -> ApiResult<()> {
        let club_id = club
            .id
            .ok_or_else(|| ApiError::validation("club has no id"))?;
        require_positive("member", member_id)?;
        require_positive("admin", admin_id)?;

        if member_id == admin_id {
            return Err(ApiError::validation(
                "an administrator cannot remove themselves from the club",
            ));
        }
        if club.creator_id == Some(member_id) {
            return Err(ApiError::validation("the club creator cannot be removed"));
        }

        let request = ApiRequest::delete("clubs")
            .segment(club_id)
            .segment("membres")
            .segment(member_id)
            .query("adminId", admin_id)
            .retry(RetryPolicy::none());

        match self.client.execute_unit(request).await {
            Err(error) if already_removed(error.root()) => {
                info!(club = club_id, member = member_id, "Member already removed");
                Ok(())
            }
            other => other,
        }
    }

    /// Search clubs by text and optional category
    ///
    /// GET /clubs/search?search=<term>&category=<category>
    pub async fn search(&self, term: &str, category: Option<&str>) -> Vec<Club> {
        let request = ApiRequest::get("clubs/search")
            .query("search", term)
            .query_opt("category", category);
        recover_list("clubs.search", fetch_list(&self.client, request).await)
    }

    /// Clubs awaiting moderation
    ///
    /// GET /clubs/en-attente
    pub async fn pending(&self) -> Vec<Club> {
        let request = ApiRequest::get("clubs/en-attente");
        recover_list("clubs.pending", fetch_list(&self.client, request).await)
    }

    /// Accept a pending club
    ///
    /// POST /clubs/<id>/accepter
    pub async fn accept(&self, id: i64) -> ApiResult<Club> {
        let request = ApiRequest::post("clubs").segment(id).segment("accepter");
        self.client.execute(request).await
    }

    /// Reject a pending club
    ///
    /// POST /clubs/<id>/refuser
    pub async fn reject(&self, id: i64) -> ApiResult<Club> {
        let request = ApiRequest::post("clubs").segment(id).segment("refuser");
        self.client.execute(request).await
    }

    /// Set the moderation state
    ///
    /// Accept and reject go through their dedicated routes; moving back to
    /// pending is a plain update of `etat`.
    pub async fn set_state(&self, id: i64, state: ClubState) -> ApiResult<Club> {
        match state {
            ClubState::Accepted => self.accept(id).await,
            ClubState::Rejected => self.reject(id).await,
            ClubState::Pending => {
                let request = ApiRequest::put("clubs")
                    .segment(id)
                    .json(&json!({ "etat": state }))?;
                self.client.execute(request).await
            }
        }
    }

    /// Upload the club image and return its URL
    ///
    /// POST /clubs/<id>/upload (multipart)
    pub async fn upload_image(&self, id: i64, file: FileUpload) -> ApiResult<String> {
        self.upload(id, "upload", file).await
    }

    /// Upload the club banner and return its URL
    ///
    /// POST /clubs/<id>/banner (multipart)
    pub async fn upload_banner(&self, id: i64, file: FileUpload) -> ApiResult<String> {
        self.upload(id, "banner", file).await
    }

    async fn upload(&self, id: i64, route: &str, file: FileUpload) -> ApiResult<String> {
        require_positive("club", id)?;
        if !file.content_type.starts_with("image/") {
            return Err(ApiError::validation("the file must be an image"));
        }

        let request = ApiRequest::post("clubs").segment(id).segment(route).file(file);
        self.client.execute_upload(request).await
    }

    /// Remove the club image
    ///
    /// DELETE /clubs/<id>/image
    pub async fn remove_image(&self, id: i64) -> ApiResult<()> {
        require_positive("club", id)?;
        self.client
            .execute_unit(ApiRequest::delete("clubs").segment(id).segment("image"))
            .await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A student club
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    /// Backend id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Club name
    #[serde(rename = "nom", default, deserialize_with = "null_default")]
    pub name: String,
    /// What the club is about
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    /// Category id, when sent flat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Nested category summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Creation day
    #[serde(rename = "dateCreation", default, with = "wire::date")]
    pub created_on: Option<NaiveDate>,
    /// Moderation state
    #[serde(rename = "etat", default)]
    pub state: ClubState,
    /// Student who proposed the club
    #[serde(rename = "createurId", default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<i64>,
    /// Member count as last reported
    #[serde(rename = "membres", default, deserialize_with = "null_default")]
    pub member_count: u32,
    /// Logo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Banner URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl Club {
    /// Category id, from the flat field or the nested summary
    #[must_use]
    pub fn category_key(&self) -> Option<i64> {
        self.category_id
            .or_else(|| self.category.as_ref().and_then(|category| category.id))
    }
}

impl Keyed for Club {
    fn key(&self) -> Option<i64> {
        self.id
    }
}

/// Fields for proposing or patching a club
///
/// Unset fields are omitted from update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubDraft {
    /// Club name
    #[serde(rename = "nom", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// What the club is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category id, when sent flat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Creation day; defaults to today on create
    #[serde(
        rename = "dateCreation",
        default,
        with = "wire::date",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_on: Option<NaiveDate>,
    /// Student who proposed the club
    #[serde(rename = "createurId", skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<i64>,
    /// Logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Banner URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl ClubDraft {
    /// Draft with the required fields
    pub fn new(name: impl Into<String>, description: impl Into<String>, category_id: i64) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    /// Set the creator
    #[must_use]
    pub fn with_creator(mut self, creator_id: i64) -> Self {
        self.creator_id = Some(creator_id);
        self
    }

    /// Set the creation day
    #[must_use]
    pub fn with_created_on(mut self, day: NaiveDate) -> Self {
        self.created_on = Some(day);
        self
    }

    fn into_create_request(self, today: NaiveDate) -> ApiResult<CreateClubRequest> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::validation("the club name is required"))?;
        let description = self
            .description
            .filter(|description| !description.trim().is_empty())
            .ok_or_else(|| ApiError::validation("the club description is required"))?;
        let category_id = self
            .category_id
            .ok_or_else(|| ApiError::validation("the club category is required"))?;
        require_positive("category", category_id)?;

        Ok(CreateClubRequest {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            category_id,
            created_on: self.created_on.unwrap_or(today).format("%Y-%m-%d").to_string(),
            creator_id: self.creator_id,
        })
    }
}

/// Exact body expected by `POST /clubs`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateClubRequest {
    #[serde(rename = "nom")]
    name: String,
    description: String,
    category_id: i64,
    #[serde(rename = "dateCreation")]
    created_on: String,
    #[serde(rename = "createurId", skip_serializing_if = "Option::is_none")]
    creator_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::scripted;
    use crate::testing::ScriptedTransport;
    use crate::transport::RequestBody;
    use serde_json::json;

    fn club(id: i64, creator: i64) -> Club {
        Club {
            id: Some(id),
            creator_id: Some(creator),
            ..Club::default()
        }
    }

    #[test]
    fn test_club_wire_names() {
        let club: Club = serde_json::from_value(json!({
            "id": 3,
            "nom": "Club Robotique",
            "dateCreation": "2023-11-15",
            "etat": "ACCEPTER",
            "membres": 12,
            "category": {"id": 2, "nom": "Sciences"}
        }))
        .unwrap();

        assert_eq!(club.name, "Club Robotique");
        assert_eq!(club.state, ClubState::Accepted);
        assert_eq!(club.member_count, 12);
        assert_eq!(club.category_key(), Some(2));
        assert_eq!(club.created_on, NaiveDate::from_ymd_opt(2023, 11, 15));
    }

    #[tokio::test]
    async fn test_public_listing_keeps_accepted() {
        let (client, _) = scripted(ScriptedTransport::new().push_json(
            200,
            json!([
                {"id": 1, "nom": "A", "etat": "ACCEPTER"},
                {"id": 2, "nom": "B", "etat": "EN_ATTENTE"},
                {"id": 3, "nom": "C", "etat": "REFUSER"}
            ]),
        ));

        let clubs = client.clubs().list(true).await;
        assert_eq!(clubs.len(), 1);
        assert_eq!(clubs[0].name, "A");
    }

    #[tokio::test]
    async fn test_member_counts_refreshed() {
        let (client, _) = scripted(
            ScriptedTransport::new()
                .push_json(200, json!([{"id": 1, "nom": "A", "membres": 0}]))
                .push_json(200, json!([{"id": 10, "userId": 1}, {"id": 11, "userId": 2}])),
        );

        let clubs = client.clubs().list_with_member_counts(false).await;
        assert_eq!(clubs[0].member_count, 2);
    }

    #[tokio::test]
    async fn test_create_validates_before_sending() {
        let (client, transport) = scripted(ScriptedTransport::new());

        let err = client
            .clubs()
            .create(ClubDraft::new("  ", "desc", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = client
            .clubs()
            .create(ClubDraft::new("Echecs", "desc", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_formats_date() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(201, json!({"id": 4, "nom": "Echecs", "etat": "EN_ATTENTE"})),
        );

        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        client
            .clubs()
            .create(ClubDraft::new("Echecs", "Jeu d'échecs", 2).with_created_on(day).with_creator(7))
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(
            request.body,
            RequestBody::Json(json!({
                "nom": "Echecs",
                "description": "Jeu d'échecs",
                "categoryId": 2,
                "dateCreation": "2024-03-05",
                "createurId": 7
            }))
        );
    }

    #[tokio::test]
    async fn test_delete_checks_creator() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(200, json!({"id": 4, "createurId": 7})),
        );

        let err = client.clubs().delete(4, Some(8)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_member_refusals_skip_transport() {
        let (client, transport) = scripted(ScriptedTransport::new());
        let club = club(4, 7);

        let err = client.clubs().remove_member(&club, 7, 3).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = client.clubs().remove_member(&club, 3, 3).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_member_already_gone_is_success() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(500, json!({"message": "Le membre n'existe pas"})),
        );
        let club = club(4, 7);

        client.clubs().remove_member(&club, 5, 3).await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.path(), "/api/clubs/4/membres/5");
        assert_eq!(request.query_param("adminId").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_remove_member_not_retried_under_default_policy() {
        let gone = json!({"message": "Le membre n'existe pas"});
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_json(500, gone.clone())
                .push_json(500, gone.clone())
                .push_json(500, gone),
        );

        client.clubs().remove_member(&club(4, 7), 5, 3).await.unwrap();
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_member_other_server_error_surfaces() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(500, json!({"message": "Erreur interne"})),
        );

        let err = client.clubs().remove_member(&club(4, 7), 5, 3).await.unwrap_err();
        assert!(matches!(err, ApiError::ApiResponse { status: 500, .. }));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_set_state_routes() {
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_json(200, json!({"id": 4, "etat": "ACCEPTER"}))
                .push_json(200, json!({"id": 4, "etat": "EN_ATTENTE"})),
        );

        client.clubs().set_state(4, ClubState::Accepted).await.unwrap();
        assert_eq!(transport.last_request().unwrap().url.path(), "/api/clubs/4/accepter");

        client.clubs().set_state(4, ClubState::Pending).await.unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, reqwest::Method::PUT);
        assert_eq!(request.body, RequestBody::Json(json!({"etat": "EN_ATTENTE"})));
    }

    #[tokio::test]
    async fn test_banner_requires_image() {
        let (client, transport) = scripted(ScriptedTransport::new());
        let file = FileUpload::new("notes.txt", "text/plain", vec![1]);

        assert!(client.clubs().upload_banner(4, file).await.is_err());
        assert_eq!(transport.request_count(), 0);
    }
}
