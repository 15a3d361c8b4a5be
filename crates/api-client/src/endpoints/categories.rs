//! Club category endpoints

use super::{fetch_list, recover_list, require_positive};
use crate::client::{ApiRequest, CampusClient};
use crate::error::{ApiError, ApiResult};
use crate::sync::Keyed;
use crate::wire::null_default;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// Categories API interface
#[derive(Clone)]
pub struct CategoriesApi {
    client: CampusClient,
}

impl CategoriesApi {
    /// Create a new categories API interface
    pub(crate) fn new(client: CampusClient) -> Self {
        Self { client }
    }

    /// GET /categories
    pub async fn list(&self) -> Vec<Category> {
        recover_list(
            "categories.list",
            fetch_list(&self.client, ApiRequest::get("categories")).await,
        )
    }

    /// GET /categories/<id>
    pub async fn get(&self, id: i64) -> ApiResult<Category> {
        require_positive("category", id)?;
        self.client
            .execute(ApiRequest::get("categories").segment(id))
            .await
    }

    /// POST /categories
    pub async fn create(&self, name: &str) -> ApiResult<Category> {
        let name = checked_name(name)?;
        let request = ApiRequest::post("categories").json(&json!({ "nom": name }))?;
        let category: Category = self.client.execute(request).await?;
        info!(category = ?category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// PUT /categories/<id>
    pub async fn update(&self, id: i64, name: &str) -> ApiResult<Category> {
        require_positive("category", id)?;
        let name = checked_name(name)?;
        let request = ApiRequest::put("categories")
            .segment(id)
            .json(&json!({ "id": id, "nom": name }))?;
        self.client.execute(request).await
    }

    /// DELETE /categories/<id>
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        require_positive("category", id)?;
        self.client
            .execute_unit(ApiRequest::delete("categories").segment(id))
            .await
    }
}

fn checked_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        Err(ApiError::validation("the category name is required"))
    } else {
        Ok(name)
    }
}

/// A club category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Backend id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name
    #[serde(rename = "nom", default, deserialize_with = "null_default")]
    pub name: String,
}

impl Keyed for Category {
    fn key(&self) -> Option<i64> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::scripted;
    use crate::testing::ScriptedTransport;
    use crate::transport::RequestBody;

    #[tokio::test]
    async fn test_list_accepts_paged_envelope() {
        let (client, _) = scripted(ScriptedTransport::new().push_json(
            200,
            json!({"content": [{"id": 1, "nom": "Sport"}, {"id": 2, "nom": "Culture"}]}),
        ));

        let categories = client.categories().list().await;
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].name, "Culture");
    }

    #[tokio::test]
    async fn test_create_trims_name() {
        let (client, transport) =
            scripted(ScriptedTransport::new().push_json(201, json!({"id": 3, "nom": "Art"})));

        let category = client.categories().create("  Art ").await.unwrap();
        assert_eq!(category.id, Some(3));
        assert_eq!(
            transport.last_request().unwrap().body,
            RequestBody::Json(json!({"nom": "Art"}))
        );
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (client, transport) = scripted(ScriptedTransport::new());
        assert!(matches!(
            client.categories().create("   ").await,
            Err(ApiError::Validation(_))
        ));
        assert_eq!(transport.request_count(), 0);
    }
}
