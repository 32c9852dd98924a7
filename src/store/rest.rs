//! REST client for the hosted document database.
//!
//! Thin wrapper over the service's JSON API:
//! - `POST   {base}/v1/collections/{name}/documents`       → create
//! - `POST   {base}/v1/collections/{name}/documents/query` → filtered fetch
//! - `PATCH  {base}/v1/collections/{name}/documents/{id}`  → merge update
//! - `DELETE {base}/v1/collections/{name}/documents/{id}`  → delete
//!
//! The service serializes writes per document; this client adds no
//! locking, no caching and no retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config;

use super::{DocumentStore, Filter, OrderBy, StoreError, StoredDocument};

pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    /// Client configured from `CLINICDESK_BACKEND_URL` / `CLINICDESK_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(&config::backend_url(), config::backend_api_key())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/v1/collections/{}/documents", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        collection: &str,
        id: Option<&str>,
    ) -> Result<reqwest::Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Request body for the query endpoint.
#[derive(Serialize)]
struct QueryRequest<'a> {
    filters: &'a [Filter],
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<&'a OrderBy>,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    documents: Vec<StoredDocument>,
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError> {
        let request = self.client.post(self.documents_url(collection)).json(&record);
        let response = self.send(request, collection, None).await?;
        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(created.id)
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let body = QueryRequest { filters, order_by };
        let request = self
            .client
            .post(format!("{}/query", self.documents_url(collection)))
            .json(&body);
        let response = self.send(request, collection, None).await?;
        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(result.documents)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.document_url(collection, id))
            .json(&patch);
        self.send(request, collection, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let request = self.client.delete(self.document_url(collection, id));
        self.send(request, collection, Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = RestStore::new("https://api.clinic.example/", None);
        assert_eq!(store.base_url(), "https://api.clinic.example");
    }

    #[test]
    fn document_urls() {
        let store = RestStore::new("https://api.clinic.example", None);
        assert_eq!(
            store.documents_url("appointments"),
            "https://api.clinic.example/v1/collections/appointments/documents"
        );
        assert_eq!(
            store.document_url("appointments", "abc123"),
            "https://api.clinic.example/v1/collections/appointments/documents/abc123"
        );
    }

    #[test]
    fn query_request_omits_missing_order() {
        let filters = [Filter::eq("email", "a@x.com")];
        let body = QueryRequest {
            filters: &filters,
            order_by: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"filters\""));
        assert!(!json.contains("order_by"));
    }

    #[test]
    fn query_request_serializes_order() {
        let order = OrderBy::desc("created_at");
        let body = QueryRequest {
            filters: &[],
            order_by: Some(&order),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"created_at\""));
        assert!(json.contains("\"desc\""));
    }
}
