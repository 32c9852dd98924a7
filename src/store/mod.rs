//! Hosted document-store boundary.
//!
//! The clinic keeps no storage of its own: every record lives in a
//! hosted document database reached through the `DocumentStore` trait.
//! Two backends implement it — `rest::RestStore` talks to the hosted
//! service, `memory::MemoryStore` stands in for it in tests and
//! offline development. Writes to a single document are serialized by
//! the backend; nothing here adds locking on top.

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid {entity} record: {reason}")]
    Decode { entity: &'static str, reason: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Internal lock error")]
    LockPoisoned,
}

// ─── Query building blocks ────────────────────────────────────────────────────

/// Equality filter on a single record field (`where field == value`).
/// Equality is all the clinic's queries need.
#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Single-field ordering for a query.
#[derive(Debug, Clone, Serialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// One stored document: the store-assigned id plus the record body.
/// The id lives beside the record, never inside it.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

// ─── The boundary trait ───────────────────────────────────────────────────────

/// Async boundary to the hosted document database.
///
/// Every call is an independent suspend point; callers never hold a
/// lock across one. Failures surface as `StoreError` and are never
/// retried here — re-action is up to the user.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a record; the store assigns and returns the id.
    async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError>;

    /// Fetch all records matching every filter, optionally ordered.
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Merge `patch` into an existing record. Untouched fields survive.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Remove a record. Irreversible.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_eq_builds_field_and_value() {
        let f = Filter::eq("email", "doc@clinic.example");
        assert_eq!(f.field, "email");
        assert_eq!(f.value, json!("doc@clinic.example"));

        let f = Filter::eq("is_active", true);
        assert_eq!(f.value, json!(true));
    }

    #[test]
    fn order_by_constructors() {
        let o = OrderBy::desc("created_at");
        assert_eq!(o.field, "created_at");
        assert_eq!(o.direction, Direction::Desc);

        let o = OrderBy::asc("date");
        assert_eq!(o.direction, Direction::Asc);
    }

    #[test]
    fn direction_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Desc).unwrap(), "\"desc\"");
        assert_eq!(serde_json::to_string(&Direction::Asc).unwrap(), "\"asc\"");
    }
}
