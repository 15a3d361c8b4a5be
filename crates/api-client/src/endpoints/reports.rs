//! Forum report endpoints
//!
//! Students flag posts; moderators work through the pending queue and mark
//! reports reviewed or resolved. Reports live on the forum service.

use super::{fetch_list, recover_list, require_positive, UserSummary};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::status::ReportStatus;
use crate::sync::Keyed;
use crate::wire::{self, null_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// Reports API interface
#[derive(Clone)]
pub struct ReportsApi {
    client: CampusClient,
}

impl ReportsApi {
    /// Create a new reports API interface
    pub(crate) fn new(client: CampusClient) -> Self {
        Self { client }
    }

    /// Flag a post
    ///
    /// POST /reports
    pub async fn create(&self, user_id: i64, post_id: i64, reason: &str) -> ApiResult<Report> {
        require_positive("user", user_id)?;
        require_positive("post", post_id)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::validation("a report needs a reason"));
        }

        let request = ApiRequest::post("reports")
            .json(&json!({ "postId": post_id, "userId": user_id, "reason": reason }))?
            .forum();
        let report: Report = self.client.execute(request).await?;
        info!(report = ?report.id, post = post_id, "Post reported");
        Ok(report)
    }

    /// Reports waiting for a moderator
    ///
    /// GET /reports/pending
    pub async fn pending(&self) -> Vec<Report> {
        let request = ApiRequest::get("reports/pending").forum();
        recover_list("reports.pending", fetch_list(&self.client, request).await)
    }

    /// Reports filed against a post
    ///
    /// GET /reports/post/<postId>
    pub async fn for_post(&self, post_id: i64) -> Vec<Report> {
        let request = ApiRequest::get("reports/post").segment(post_id).forum();
        recover_list("reports.for_post", fetch_list(&self.client, request).await)
    }

    /// Move a report through moderation
    ///
    /// PUT /reports/<id>/status
    pub async fn set_status(&self, report_id: i64, status: ReportStatus) -> ApiResult<Report> {
        require_positive("report", report_id)?;
        let request = ApiRequest::put("reports")
            .segment(report_id)
            .segment("status")
            .json(&json!({ "status": status }))?
            .forum();
        self.client.execute(request).await
    }

    /// Mark a report handled
    pub async fn resolve(&self, report_id: i64) -> ApiResult<Report> {
        self.set_status(report_id, ReportStatus::Resolved).await
    }

    /// DELETE /reports/<id>
    pub async fn delete(&self, report_id: i64) -> ApiResult<()> {
        require_positive("report", report_id)?;
        self.client
            .execute_unit(ApiRequest::delete("reports").segment(report_id).forum())
            .await
    }
}

/// A moderation report on a forum post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Backend id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Why the post was flagged
    #[serde(default, deserialize_with = "null_default")]
    pub reason: String,
    /// Moderation status
    #[serde(default)]
    pub status: ReportStatus,
    /// Reporting user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Reporting user's display name
    #[serde(default, alias = "reportedBy", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Flagged post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    /// Excerpt of the flagged post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_content: Option<String>,
    /// Author of the flagged post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_author: Option<String>,
    /// When the report was filed
    #[serde(default, with = "wire::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Reporting user's profile, when embedded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl Keyed for Report {
    fn key(&self) -> Option<i64> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{scripted, scripted_with};
    use crate::config::ClientConfig;
    use crate::testing::ScriptedTransport;
    use crate::transport::RequestBody;

    #[tokio::test]
    async fn test_create_goes_to_forum_service() {
        let config = ClientConfig::default().with_forum_url("http://localhost:8082/api");
        let (client, transport) = scripted_with(
            config,
            ScriptedTransport::new()
                .push_json(200, json!({"id": 4, "reason": "Spam", "status": "PENDING", "postId": 8})),
        );

        let report = client.reports().create(5, 8, "  Spam ").await.unwrap();
        assert_eq!(report.status, ReportStatus::Pending);

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.as_str(), "http://localhost:8082/api/reports");
        assert_eq!(
            request.body,
            RequestBody::Json(json!({"postId": 8, "userId": 5, "reason": "Spam"}))
        );
    }

    #[tokio::test]
    async fn test_blank_reason_rejected() {
        let (client, transport) = scripted(ScriptedTransport::new());
        assert!(matches!(
            client.reports().create(5, 8, "   ").await,
            Err(ApiError::Validation(_))
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_queue_recovers_to_empty() {
        let (client, _) = scripted(ScriptedTransport::new().push_json(
            200,
            json!([{"id": 1, "reason": "Spam", "status": "PENDING", "reportedBy": "Lina"}]),
        ));

        let pending = client.reports().pending().await;
        assert_eq!(pending[0].username.as_deref(), Some("Lina"));
        assert!(pending[0].status.is_open());

        assert!(client.reports().pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_sends_status() {
        let (client, transport) = scripted(
            ScriptedTransport::new().push_json(200, json!({"id": 4, "status": "RESOLVED"})),
        );

        let report = client.reports().resolve(4).await.unwrap();
        assert_eq!(report.status, ReportStatus::Resolved);

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, reqwest::Method::PUT);
        assert_eq!(request.url.path(), "/api/reports/4/status");
        assert_eq!(request.body, RequestBody::Json(json!({"status": "RESOLVED"})));
    }
}
