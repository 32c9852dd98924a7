use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{StoreError, StoredDocument};

/// Allowlist entry granting dashboard access.
///
/// Provisioned directly in the backend console; this crate never
/// creates or edits one. Login requires a matching entry with
/// `is_active == true` before credentials are even checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedDoctor {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_active: bool,
}

impl AuthorizedDoctor {
    pub fn from_document(doc: StoredDocument) -> Result<Self, StoreError> {
        let mut value = doc.data;
        match value.as_object_mut() {
            Some(record) => {
                record.insert("id".to_string(), Value::String(doc.id));
            }
            None => {
                return Err(StoreError::Decode {
                    entity: "authorized doctor",
                    reason: "document is not a JSON object".into(),
                })
            }
        }
        serde_json::from_value(value).map_err(|e| StoreError::Decode {
            entity: "authorized doctor",
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_document_decodes_entry() {
        let doc = StoredDocument {
            id: "doc-1".into(),
            data: json!({
                "email": "gajala@clinic.example",
                "name": "Dr. Gajala Parween",
                "is_active": true,
            }),
        };
        let doctor = AuthorizedDoctor::from_document(doc).unwrap();
        assert_eq!(doctor.id, "doc-1");
        assert_eq!(doctor.email, "gajala@clinic.example");
        assert!(doctor.is_active);
    }

    #[test]
    fn from_document_rejects_missing_flag() {
        let doc = StoredDocument {
            id: "doc-2".into(),
            data: json!({"email": "x@y.z", "name": "Dr. X"}),
        };
        assert!(AuthorizedDoctor::from_document(doc).is_err());
    }
}
