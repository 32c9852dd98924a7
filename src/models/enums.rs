use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Where an appointment sits in its lifecycle.
///
/// The workflow is a fixed table: a new request is always `Pending`;
/// the doctor accepts or cancels it; an accepted request can only be
/// completed. `Cancelled` and `Completed` are terminal. Every caller
/// that writes a status goes through `can_transition_to`, so the
/// table cannot be bypassed by a new code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::Cancelled,
        Self::Completed,
    ];

    /// Store string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Statuses reachable from this one.
    pub fn allowed_transitions(self) -> &'static [AppointmentStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Cancelled],
            Self::Accepted => &[Self::Completed],
            Self::Cancelled | Self::Completed => &[],
        }
    }

    pub fn can_transition_to(self, target: AppointmentStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(StoreError::InvalidEnum {
                field: "status".into(),
                value: s.into(),
            }),
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
