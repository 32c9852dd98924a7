//! In-memory document store.
//!
//! Same contract as the hosted backend, held in a process-local map.
//! Used by the test suite and for offline development; never in
//! production. Ids are random UUIDs, matching the opaque ids the
//! hosted service assigns.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{DocumentStore, Filter, OrderBy, StoreError, StoredDocument};

pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records in a collection. Test helper.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError> {
        if !record.is_object() {
            return Err(StoreError::Decode {
                entity: "document",
                reason: "record must be a JSON object".into(),
            });
        }

        let id = Uuid::new_v4().to_string();
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        let mut matches: Vec<StoredDocument> = collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, data)| filters.iter().all(|f| matches_filter(data, f)))
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order_by {
            matches.sort_by(|a, b| {
                let ord = compare_values(a.data.get(&order.field), b.data.get(&order.field));
                match order.direction {
                    super::Direction::Asc => ord,
                    super::Direction::Desc => ord.reverse(),
                }
            });
        }

        Ok(matches)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::Decode {
                    entity: "document",
                    reason: "patch must be a JSON object".into(),
                })
            }
        };

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let record = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if let Some(existing) = record.as_object_mut() {
            for (key, value) in patch {
                existing.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let removed = collections
            .get_mut(collection)
            .and_then(|records| records.remove(id));

        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

fn matches_filter(data: &Value, filter: &Filter) -> bool {
    data.get(&filter.field) == Some(&filter.value)
}

/// Field ordering for `order_by`. Missing fields sort last either way.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.create("things", json!({"n": 1})).await.unwrap();
        let b = store.create("things", json!({"n": 2})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len("things"), 2);
    }

    #[tokio::test]
    async fn create_rejects_non_object_records() {
        let store = MemoryStore::new();
        let err = store.create("things", json!("not a record")).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        assert!(store.is_empty("things"));
    }

    #[tokio::test]
    async fn query_filters_by_equality() {
        let store = MemoryStore::new();
        store
            .create("doctors", json!({"email": "a@x.com", "is_active": true}))
            .await
            .unwrap();
        store
            .create("doctors", json!({"email": "b@x.com", "is_active": false}))
            .await
            .unwrap();

        let filters = [Filter::eq("is_active", true)];
        let docs = store.query("doctors", &filters, None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["email"], "a@x.com");
    }

    #[tokio::test]
    async fn query_applies_all_filters() {
        let store = MemoryStore::new();
        store
            .create("doctors", json!({"email": "a@x.com", "is_active": false}))
            .await
            .unwrap();

        let filters = [Filter::eq("email", "a@x.com"), Filter::eq("is_active", true)];
        let docs = store.query("doctors", &filters, None).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn query_orders_descending() {
        let store = MemoryStore::new();
        store
            .create("events", json!({"at": "2026-01-02T00:00:00Z"}))
            .await
            .unwrap();
        store
            .create("events", json!({"at": "2026-01-03T00:00:00Z"}))
            .await
            .unwrap();
        store
            .create("events", json!({"at": "2026-01-01T00:00:00Z"}))
            .await
            .unwrap();

        let docs = store
            .query("events", &[], Some(&OrderBy::desc("at")))
            .await
            .unwrap();
        let dates: Vec<&str> = docs.iter().map(|d| d.data["at"].as_str().unwrap()).collect();
        assert_eq!(
            dates,
            [
                "2026-01-03T00:00:00Z",
                "2026-01-02T00:00:00Z",
                "2026-01-01T00:00:00Z"
            ]
        );
    }

    #[tokio::test]
    async fn query_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let docs = store.query("nothing", &[], None).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn update_merges_patch_fields() {
        let store = MemoryStore::new();
        let id = store
            .create("things", json!({"status": "pending", "name": "Asha"}))
            .await
            .unwrap();

        store
            .update("things", &id, json!({"status": "accepted"}))
            .await
            .unwrap();

        let docs = store.query("things", &[], None).await.unwrap();
        assert_eq!(docs[0].data["status"], "accepted");
        assert_eq!(docs[0].data["name"], "Asha", "untouched fields survive");
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("things", "no-such-id", json!({"status": "accepted"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_record() {
        let store = MemoryStore::new();
        let keep = store.create("things", json!({"n": 1})).await.unwrap();
        let gone = store.create("things", json!({"n": 2})).await.unwrap();

        store.delete("things", &gone).await.unwrap();

        let docs = store.query("things", &[], None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, keep);
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete("things", "no-such-id").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
