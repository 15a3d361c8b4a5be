//! Club membership endpoints

use super::{fetch_list, recover_list, Club};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::status::MemberRole;
use crate::sync::Keyed;
use crate::wire::null_default;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Club members API interface
#[derive(Clone)]
pub struct MembersApi {
    client: CampusClient,
}

impl MembersApi {
    /// Create a new members API interface
    pub(crate) fn new(client: CampusClient) -> Self {
        Self { client }
    }

    /// Members of a club
    ///
    /// GET /clubs/<id>/membres
    pub async fn list(&self, club_id: i64) -> Vec<ClubMember> {
        let request = ApiRequest::get("clubs").segment(club_id).segment("membres");
        recover_list("members.list", fetch_list(&self.client, request).await)
    }

    /// Members of a club, completed with user details where the listing lacks them
    ///
    /// GET /users/<id> for every incomplete member, concurrently
    pub async fn with_users(&self, club_id: i64) -> Vec<ClubMember> {
        let members = self.list(club_id).await;
        join_all(members.into_iter().map(|member| self.enrich(member))).await
    }

    async fn enrich(&self, mut member: ClubMember) -> ClubMember {
        if member.user.as_ref().is_some_and(UserSummary::is_complete) {
            return member;
        }

        match self.user(member.user_id).await {
            Ok(user) => {
                member.user = Some(match member.user.take() {
                    Some(partial) => partial.merged_with(user),
                    None => user,
                });
            }
            Err(error) => {
                debug!(user = member.user_id, error = %error, "Could not load member details");
            }
        }
        member
    }

    /// One user's public profile
    ///
    /// GET /users/<id>
    pub async fn user(&self, user_id: i64) -> ApiResult<UserSummary> {
        self.client
            .execute(ApiRequest::get("users").segment(user_id))
            .await
    }

    /// Add a user to a club
    ///
    /// POST /clubs/<id>/membres
    pub async fn add(&self, club_id: i64, user_id: i64, role: MemberRole) -> ApiResult<ClubMember> {
        let request = ApiRequest::post("clubs")
            .segment(club_id)
            .segment("membres")
            .json(&json!({ "userId": user_id, "role": role }))?;
        let member = self.client.execute(request).await?;
        info!(club = club_id, user = user_id, role = %role, "Member added");
        Ok(member)
    }

    /// Change a member's role
    ///
    /// PUT /clubs/<id>/membres/<memberId>/role
    pub async fn update_role(
        &self,
        club_id: i64,
        member_id: i64,
        role: MemberRole,
    ) -> ApiResult<ClubMember> {
        let request = ApiRequest::put("clubs")
            .segment(club_id)
            .segment("membres")
            .segment(member_id)
            .segment("role")
            .json(&json!({ "role": role }))?;
        self.client.execute(request).await
    }

    /// Remove a member; the club creator cannot be removed
    ///
    /// DELETE /clubs/<id>/membres/<memberId>
    pub async fn remove(&self, club: &Club, member_id: i64) -> ApiResult<()> {
        let club_id = club
            .id
            .ok_or_else(|| ApiError::validation("club has no id"))?;
        if club.creator_id == Some(member_id) {
            return Err(ApiError::validation("the club creator cannot be removed"));
        }

        let request = ApiRequest::delete("clubs")
            .segment(club_id)
            .segment("membres")
            .segment(member_id);
        self.client.execute_unit(request).await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A user's membership in a club
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubMember {
    /// Backend id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Member user id
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: i64,
    /// Role within the club
    #[serde(default)]
    pub role: MemberRole,
    /// Club, when the backend embeds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<Club>,
    /// Profile, once enriched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl ClubMember {
    /// Whether the member administers the club
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }

    /// Full name when known
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.user.as_ref().and_then(UserSummary::full_name)
    }
}

impl Keyed for ClubMember {
    fn key(&self) -> Option<i64> {
        self.id
    }
}

/// Public user profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Backend id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Academic department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departement: Option<String>,
}

impl UserSummary {
    /// Name and email are all present
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_name.is_some() && self.last_name.is_some() && self.email.is_some()
    }

    /// `first last`, when either part is known
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }

    /// Fill gaps in `self` from `other`
    #[must_use]
    pub fn merged_with(self, other: Self) -> Self {
        Self {
            id: self.id.or(other.id),
            first_name: other.first_name.or(self.first_name),
            last_name: other.last_name.or(self.last_name),
            email: other.email.or(self.email),
            image: other.image.or(self.image),
            departement: other.departement.or(self.departement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::scripted;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_defaults_role() {
        let (client, _) = scripted(
            ScriptedTransport::new().push_json(200, json!([{"id": 1, "userId": 4, "role": null}])),
        );

        let members = client.members().list(2).await;
        assert_eq!(members[0].role, MemberRole::Member);
    }

    #[tokio::test]
    async fn test_list_empty_on_failure() {
        let (client, _) = scripted(ScriptedTransport::new().push_text(404, "Club introuvable"));
        assert!(client.members().list(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_with_users_enriches_incomplete_members() {
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_json(
                    200,
                    json!([{"id": 1, "userId": 4, "role": "ADMIN_CLUB", "user": {"firstName": "Sami"}}]),
                )
                .push_json(
                    200,
                    json!({"id": 4, "firstName": "Sami", "lastName": "Ben Ali", "email": "s@campus.tn"}),
                ),
        );

        let members = client.members().with_users(2).await;
        assert_eq!(members[0].display_name().as_deref(), Some("Sami Ben Ali"));
        assert!(members[0].is_admin());
        assert_eq!(transport.last_request().unwrap().url.path(), "/api/users/4");
    }

    #[tokio::test]
    async fn test_remove_creator_refused_locally() {
        let (client, transport) = scripted(ScriptedTransport::new());
        let club = Club {
            id: Some(2),
            creator_id: Some(9),
            ..Club::default()
        };

        let err = client.members().remove(&club, 9).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_add_member_body() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(201, json!({"id": 5, "userId": 4, "role": "MEMBRE"})),
        );

        client.members().add(2, 4, MemberRole::Member).await.unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(
            request.body,
            crate::transport::RequestBody::Json(json!({"userId": 4, "role": "MEMBRE"}))
        );
    }
}
