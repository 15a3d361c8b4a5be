//! Forum post endpoints
//!
//! Posts live on the forum service, so every request here is sent to the
//! configured forum URL.

use super::{fetch_list, recover_list, require_positive};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::sync::Keyed;
use crate::transport::FileUpload;
use crate::wire::{self, null_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Posts API interface
#[derive(Clone)]
pub struct PostsApi {
    client: CampusClient,
}

impl PostsApi {
    /// Create a new posts API interface
    pub(crate) fn new(client: CampusClient) -> Self {
        Self { client }
    }

    /// GET /posts
    pub async fn list(&self) -> Vec<Post> {
        let request = ApiRequest::get("posts").forum();
        recover_list("posts.list", fetch_list(&self.client, request).await)
    }

    /// GET /posts/category/<category>
    pub async fn by_category(&self, category: &str) -> Vec<Post> {
        let request = ApiRequest::get("posts/category").segment(category).forum();
        recover_list("posts.by_category", fetch_list(&self.client, request).await)
    }

    /// GET /posts/search?query=<query>
    pub async fn search(&self, query: &str) -> Vec<Post> {
        let request = ApiRequest::get("posts/search").query("query", query).forum();
        recover_list("posts.search", fetch_list(&self.client, request).await)
    }

    /// GET /posts/<id>
    pub async fn get(&self, id: i64) -> ApiResult<Post> {
        self.client
            .execute(ApiRequest::get("posts").segment(id).forum())
            .await
    }

    /// Publish a post
    ///
    /// POST /posts
    pub async fn create(&self, draft: &PostDraft) -> ApiResult<Post> {
        draft.validate()?;
        let request = ApiRequest::post("posts").json(draft)?.forum();
        let post: Post = self.client.execute(request).await?;
        info!(post = ?post.id, category = ?post.category, "Post published");
        Ok(post)
    }

    /// PUT /posts/<id>
    pub async fn update(&self, id: i64, draft: &PostDraft) -> ApiResult<Post> {
        require_positive("post", id)?;
        draft.validate()?;
        let request = ApiRequest::put("posts").segment(id).json(draft)?.forum();
        self.client.execute(request).await
    }

    /// DELETE /posts/<id>
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        require_positive("post", id)?;
        self.client
            .execute_unit(ApiRequest::delete("posts").segment(id).forum())
            .await
    }

    /// Upload a post image and return its URL
    ///
    /// POST /posts/upload (multipart)
    pub async fn upload_image(&self, file: FileUpload) -> ApiResult<String> {
        let request = ApiRequest::post("posts/upload").file(file).forum();
        self.client.execute_upload(request).await
    }

    /// Toggle a like and return the updated post
    ///
    /// POST /posts/<id>/like?userId=<user>
    pub async fn like(&self, post_id: i64, user_id: i64) -> ApiResult<Post> {
        require_positive("post", post_id)?;
        let request = ApiRequest::post("posts")
            .segment(post_id)
            .segment("like")
            .query("userId", user_id)
            .forum();
        self.client.execute(request).await
    }

    /// Whether the user liked the post
    ///
    /// GET /posts/<id>/hasLiked?userId=<user>
    pub async fn has_liked(&self, post_id: i64, user_id: i64) -> ApiResult<bool> {
        let request = ApiRequest::get("posts")
            .segment(post_id)
            .segment("hasLiked")
            .query("userId", user_id)
            .forum();
        let body = self.client.execute_value(request).await?;
        match body {
            Value::Bool(liked) => Ok(liked),
            Value::Object(ref map) => map
                .get("hasLiked")
                .and_then(Value::as_bool)
                .ok_or_else(|| ApiError::UnexpectedShape("object without hasLiked".into())),
            other => Err(ApiError::UnexpectedShape(format!("hasLiked answered {other}"))),
        }
    }
}

/// A forum post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Backend id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Title; may be empty
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    /// Post body
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    /// Author display name
    #[serde(default, alias = "username", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Author id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Author avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    /// Category tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Attached image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// When the post was published
    #[serde(default, with = "wire::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last edit
    #[serde(default, with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Like count
    #[serde(default, deserialize_with = "null_default")]
    pub like_count: u32,
    /// Comment count
    #[serde(default, deserialize_with = "null_default")]
    pub comment_count: u32,
    /// Whether the requesting user liked it
    #[serde(default, deserialize_with = "null_default")]
    pub has_user_liked: bool,
}

impl Keyed for Post {
    fn key(&self) -> Option<i64> {
        self.id
    }
}

/// Body of a post creation or update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    /// Title; may be empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Post body
    pub content: String,
    /// Category tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Attached image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Author id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl PostDraft {
    /// Draft with the post body
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the category tag
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach an uploaded image
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Set the author
    #[must_use]
    pub fn by(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    fn validate(&self) -> ApiResult<()> {
        if self.content.trim().is_empty() && self.image_url.is_none() {
            return Err(ApiError::validation("a post needs content or an image"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::scripted;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    #[test]
    fn test_post_reads_forum_timestamps() {
        let post: Post = serde_json::from_value(json!({
            "id": 8,
            "content": "Qui vient au tournoi ?",
            "username": "amira",
            "createdAt": "2024-02-10 18:30:00",
            "likeCount": null
        }))
        .unwrap();

        assert_eq!(post.author.as_deref(), Some("amira"));
        assert_eq!(post.like_count, 0);
        assert_eq!(
            post.created_at.map(|at| wire::format_timestamp(&at)).as_deref(),
            Some("2024-02-10T18:30:00.000Z")
        );
    }

    #[tokio::test]
    async fn test_requests_go_to_forum() {
        let mut config = crate::config::ClientConfig::development();
        config.forum_url = "http://localhost:8080".to_string();
        let (client, transport) = crate::client::tests::scripted_with(
            config,
            ScriptedTransport::new().push_json(200, json!([])),
        );

        client.posts().search("tournoi").await;

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.host_str(), Some("localhost"));
        assert_eq!(request.url.port(), Some(8080));
        assert_eq!(request.url.path(), "/posts/search");
        assert_eq!(request.query_param("query").as_deref(), Some("tournoi"));
    }

    #[tokio::test]
    async fn test_create_requires_content() {
        let (client, transport) = scripted(ScriptedTransport::new());
        let err = client.posts().create(&PostDraft::new("  ")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_like_returns_updated_post() {
        let (client, transport) = scripted(
            ScriptedTransport::new()
                .push_json(200, json!({"id": 8, "content": "x", "likeCount": 3, "hasUserLiked": true})),
        );

        let post = client.posts().like(8, 5).await.unwrap();
        assert_eq!(post.like_count, 3);
        assert!(post.has_user_liked);
        assert_eq!(transport.last_request().unwrap().query_param("userId").as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_has_liked_shapes() {
        let (client, _) = scripted(
            ScriptedTransport::new()
                .push_json(200, json!({"hasLiked": true}))
                .push_json(200, json!(false))
                .push_json(200, json!("yes")),
        );

        assert!(client.posts().has_liked(8, 5).await.unwrap());
        assert!(!client.posts().has_liked(8, 5).await.unwrap());
        assert!(matches!(
            client.posts().has_liked(8, 5).await,
            Err(ApiError::UnexpectedShape(_))
        ));
    }
}
