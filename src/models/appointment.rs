use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{StoreError, StoredDocument};

use super::enums::AppointmentStatus;

/// One patient appointment request, as kept in the `appointments`
/// collection. The backing store owns the record; copies held by the
/// dashboard are a read cache reconciled after every write.
///
/// Timestamps are serialized as epoch microseconds so the backend can
/// order on them exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub full_name: String,
    pub mobile: String,
    pub email: String,
    pub service: String,
    /// Requested day, `YYYY-MM-DD`.
    pub date: String,
    /// Requested slot label, e.g. `"10:00 AM"`.
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: AppointmentStatus,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Decode a stored document, validating the record shape. Malformed
    /// records are rejected here rather than leaking into the dashboard.
    pub fn from_document(doc: StoredDocument) -> Result<Self, StoreError> {
        let mut value = doc.data;
        match value.as_object_mut() {
            Some(record) => {
                record.insert("id".to_string(), Value::String(doc.id));
            }
            None => {
                return Err(StoreError::Decode {
                    entity: "appointment",
                    reason: "document is not a JSON object".into(),
                })
            }
        }
        serde_json::from_value(value).map_err(|e| StoreError::Decode {
            entity: "appointment",
            reason: e.to_string(),
        })
    }
}

/// Candidate appointment from the public booking form: everything the
/// patient fills in, nothing the system assigns (id, status,
/// timestamps).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub full_name: String,
    pub mobile: String,
    pub email: String,
    pub service: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Status counts over the whole collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total: u64,
    pub pending: u64,
    pub accepted: u64,
    pub cancelled: u64,
    pub completed: u64,
}

impl AppointmentStats {
    /// Fold one status into the counts.
    pub fn record(&mut self, status: AppointmentStatus) {
        self.total += 1;
        match status {
            AppointmentStatus::Pending => self.pending += 1,
            AppointmentStatus::Accepted => self.accepted += 1,
            AppointmentStatus::Cancelled => self.cancelled += 1,
            AppointmentStatus::Completed => self.completed += 1,
        }
    }

    /// Full-scan aggregation. Fine for a single clinic's volume; an
    /// incremental counter would only pay off at a very different scale.
    pub fn tally(statuses: impl IntoIterator<Item = AppointmentStatus>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            stats.record(status);
        }
        stats
    }

    /// Invariant check: total equals the sum of the buckets.
    pub fn is_consistent(&self) -> bool {
        self.total == self.pending + self.accepted + self.cancelled + self.completed
    }
}
