use super::appointment::Appointment;
use super::enums::AppointmentStatus;

/// Dashboard list filters. Every populated filter must match (logical
/// AND); filtering never touches the store, it narrows the cached
/// collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    /// `None` shows all statuses.
    pub status: Option<AppointmentStatus>,
    /// Case-insensitive substring over name, email and service;
    /// substring over the mobile number as typed.
    pub search: String,
    /// Exact match on the requested date (`YYYY-MM-DD`).
    pub date: Option<String>,
}

impl AppointmentFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.search.is_empty() && self.date.is_none()
    }

    /// Pure predicate — same filter, same appointment, same answer.
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let Some(status) = self.status {
            if appointment.status != status {
                return false;
            }
        }

        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let hit = appointment.full_name.to_lowercase().contains(&needle)
                || appointment.email.to_lowercase().contains(&needle)
                || appointment.service.to_lowercase().contains(&needle)
                || appointment.mobile.contains(&self.search);
            if !hit {
                return false;
            }
        }

        if let Some(date) = &self.date {
            if &appointment.date != date {
                return false;
            }
        }

        true
    }

    /// The visible slice of the collection, in its incoming order.
    pub fn apply(&self, appointments: &[Appointment]) -> Vec<Appointment> {
        appointments
            .iter()
            .filter(|apt| self.matches(apt))
            .cloned()
            .collect()
    }
}
