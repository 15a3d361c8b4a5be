//! Forum comment endpoints

use super::{fetch_list, require_positive};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::retry::RetryPolicy;
use crate::sync::Keyed;
use crate::wire::{self, null_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Shortest accepted comment, after trimming
pub const MIN_COMMENT_LENGTH: usize = 3;

/// Comments API interface
#[derive(Clone)]
pub struct CommentsApi {
    client: CampusClient,
    submission: RetryPolicy,
}

impl CommentsApi {
    /// Create a new comments API interface
    pub(crate) fn new(client: CampusClient) -> Self {
        Self {
            client,
            submission: RetryPolicy::comment_submission(),
        }
    }

    /// Replace the retry policy used when posting comments
    #[must_use]
    pub fn with_submission_policy(mut self, policy: RetryPolicy) -> Self {
        self.submission = policy;
        self
    }

    /// Comments of a post
    ///
    /// A 404 or 500 usually means the post was deleted and yields an empty
    /// list, as does any other failure.
    ///
    /// GET /comments/post/<postId>
    pub async fn for_post(&self, post_id: i64) -> Vec<Comment> {
        let request = ApiRequest::get("comments/post").segment(post_id).forum();
        match fetch_list(&self.client, request).await {
            Ok(comments) => comments,
            Err(error) if matches!(error.root(), ApiError::ApiResponse { status: 404 | 500, .. }) => {
                debug!(post = post_id, "Post has no reachable comments");
                Vec::new()
            }
            Err(error) => {
                warn!(post = post_id, error = %error, "Listing comments failed, returning empty list");
                Vec::new()
            }
        }
    }

    /// GET /comments/<id>
    pub async fn get(&self, id: i64) -> ApiResult<Comment> {
        self.client
            .execute(ApiRequest::get("comments").segment(id).forum())
            .await
    }

    /// Number of comments on a post
    ///
    /// GET /comments/count/<postId>
    pub async fn count(&self, post_id: i64) -> ApiResult<u64> {
        let request = ApiRequest::get("comments/count").segment(post_id).forum();
        let body = self.client.execute_value(request).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .or_else(|| body.as_u64())
            .ok_or_else(|| ApiError::UnexpectedShape(format!("comment count answered {body}")))
    }

    /// Post a comment
    ///
    /// The content is trimmed and must keep at least three characters. The
    /// created comment must come back with an id.
    ///
    /// POST /comments
    pub async fn create(&self, user_id: i64, post_id: i64, content: &str) -> ApiResult<Comment> {
        require_positive("user", user_id)?;
        require_positive("post", post_id)?;

        let content = content.trim();
        if content.chars().count() < MIN_COMMENT_LENGTH {
            return Err(ApiError::validation(format!(
                "a comment needs at least {MIN_COMMENT_LENGTH} characters"
            )));
        }

        let request = ApiRequest::post("comments")
            .json(&json!({ "content": content, "userId": user_id, "postId": post_id }))?
            .forum()
            .retry(self.submission.clone());
        let comment: Comment = self.client.execute(request).await?;

        if comment.id.is_none() {
            return Err(ApiError::UnexpectedShape("created comment has no id".to_string()));
        }
        info!(comment = ?comment.id, post = post_id, "Comment posted");
        Ok(comment)
    }

    /// Toggle a like and return the updated comment
    ///
    /// POST /comments/<id>/like?userId=<user>
    pub async fn like(&self, comment_id: i64, user_id: i64) -> ApiResult<Comment> {
        require_positive("comment", comment_id)?;
        let request = ApiRequest::post("comments")
            .segment(comment_id)
            .segment("like")
            .query("userId", user_id)
            .forum();
        self.client.execute(request).await
    }

    /// DELETE /comments/<id>
    pub async fn delete(&self, comment_id: i64) -> ApiResult<()> {
        require_positive("comment", comment_id)?;
        self.client
            .execute_unit(ApiRequest::delete("comments").segment(comment_id).forum())
            .await
    }
}

/// A comment on a forum post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Backend id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Comment text
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    /// Author id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Author display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Author avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    /// Post the comment belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    /// When the comment was posted
    #[serde(default, with = "wire::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Like count
    #[serde(default, alias = "likeCount", deserialize_with = "null_default")]
    pub likes: u32,
    /// Whether the requesting user liked it
    #[serde(default, deserialize_with = "null_default")]
    pub has_user_liked: bool,
}

impl Keyed for Comment {
    fn key(&self) -> Option<i64> {
        self.id
    }
}
