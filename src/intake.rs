//! Public appointment intake.
//!
//! Validates a patient-submitted draft and persists it with status
//! `pending`. The booking form already enforces required fields in the
//! browser, but everything is re-checked here so a malformed record
//! can never reach the store, whatever surface submitted it.
//!
//! Nothing retries: a failed save surfaces one error and the caller
//! keeps the draft so the patient can resubmit.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::{json, Value};

use crate::config;
use crate::models::{AppointmentDraft, AppointmentStatus};
use crate::store::{DocumentStore, StoreError};

// ─── Booking menu ─────────────────────────────────────────────────────────────

/// Services offered on the booking form. A submitted service must be
/// one of these labels, verbatim.
pub const SERVICES: &[&str] = &[
    "Women's Health & Gynecology",
    "Pediatric & Child Care",
    "Chronic Disease Management",
    "Digestive Health",
    "Mental Health & Wellness",
    "Preventive Care & Immunity",
    "General Consultation",
];

/// Bookable half-hour slots. Mirrors the clinic's consulting hours,
/// with the lunch break between 12:30 PM and 02:00 PM.
pub const TIME_SLOTS: &[&str] = &[
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "12:00 PM", "12:30 PM", "02:00 PM", "02:30 PM", "03:00 PM", "03:30 PM",
    "04:00 PM", "04:30 PM", "05:00 PM", "05:30 PM", "06:00 PM", "06:30 PM",
];

const MAX_NAME_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 2000;

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static RE_MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9(][0-9 ()\-]{5,18}[0-9]$").unwrap());

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Full name is required")]
    MissingName,
    #[error("Full name too long (max 200 chars)")]
    NameTooLong,
    #[error("Mobile number is required")]
    MissingMobile,
    #[error("Invalid mobile number: {0}")]
    InvalidMobile(String),
    #[error("Email is required")]
    MissingEmail,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Please choose a service")]
    MissingService,
    #[error("Unknown service: {0}")]
    UnknownService(String),
    #[error("Date is required")]
    MissingDate,
    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,
    #[error("Time is required")]
    MissingTime,
    #[error("Unknown time slot: {0}")]
    UnknownTimeSlot(String),
    #[error("Message too long (max 2000 chars)")]
    MessageTooLong,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Could not save the appointment: {0}")]
    Store(#[from] StoreError),
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// Checks a draft against the booking rules. Field order matches the
/// form top to bottom, so the first error is the one the patient sees.
pub fn validate_draft(draft: &AppointmentDraft) -> Result<(), ValidationError> {
    let full_name = draft.full_name.trim();
    if full_name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if full_name.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }

    let mobile = draft.mobile.trim();
    if mobile.is_empty() {
        return Err(ValidationError::MissingMobile);
    }
    let digits = mobile.chars().filter(char::is_ascii_digit).count();
    if !RE_MOBILE.is_match(mobile) || !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidMobile(mobile.to_string()));
    }

    let email = draft.email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if !RE_EMAIL.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    let service = draft.service.trim();
    if service.is_empty() {
        return Err(ValidationError::MissingService);
    }
    if !SERVICES.contains(&service) {
        return Err(ValidationError::UnknownService(service.to_string()));
    }

    let date = draft.date.trim();
    if date.is_empty() {
        return Err(ValidationError::MissingDate);
    }
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(ValidationError::InvalidDate);
    }

    let time = draft.time.trim();
    if time.is_empty() {
        return Err(ValidationError::MissingTime);
    }
    if !TIME_SLOTS.contains(&time) {
        return Err(ValidationError::UnknownTimeSlot(time.to_string()));
    }

    if let Some(message) = &draft.message {
        if message.len() > MAX_MESSAGE_LEN {
            return Err(ValidationError::MessageTooLong);
        }
    }

    Ok(())
}

// ─── Submission ───────────────────────────────────────────────────────────────

/// Validates and persists a new appointment request. Returns the
/// store-assigned id.
///
/// The stored record always starts `pending`, with equal creation and
/// update timestamps. Status and timestamps come from this function,
/// never from the draft.
pub async fn submit_appointment<S: DocumentStore>(
    store: &S,
    draft: &AppointmentDraft,
) -> Result<String, IntakeError> {
    validate_draft(draft)?;

    let record = new_record(draft, Utc::now());
    let id = store.create(config::APPOINTMENTS_COLLECTION, record).await?;

    tracing::info!(appointment_id = %id, service = %draft.service.trim(), "appointment request saved");
    Ok(id)
}

fn new_record(draft: &AppointmentDraft, now: DateTime<Utc>) -> Value {
    let message = draft
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    json!({
        "full_name": draft.full_name.trim(),
        "mobile": draft.mobile.trim(),
        "email": draft.email.trim(),
        "service": draft.service.trim(),
        "date": draft.date.trim(),
        "time": draft.time.trim(),
        "message": message,
        "status": AppointmentStatus::Pending,
        "created_at": now.timestamp_micros(),
        "updated_at": now.timestamp_micros(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Appointment;
    use crate::store::MemoryStore;

    fn valid_draft() -> AppointmentDraft {
        AppointmentDraft {
            full_name: "Asha Verma".into(),
            mobile: "9990001111".into(),
            email: "a@x.com".into(),
            service: "Pediatric & Child Care".into(),
            date: "2025-03-01".into(),
            time: "10:00 AM".into(),
            message: None,
        }
    }

    // ── Validation ───────────────────────────────────────

    #[test]
    fn valid_draft_passes() {
        assert_eq!(validate_draft(&valid_draft()), Ok(()));
    }

    #[test]
    fn message_is_optional() {
        let mut draft = valid_draft();
        draft.message = Some("Recurring fever since last week".into());
        assert_eq!(validate_draft(&draft), Ok(()));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut draft = valid_draft();
        draft.full_name = "   ".into();
        assert_eq!(validate_draft(&draft), Err(ValidationError::MissingName));
    }

    #[test]
    fn oversized_name_is_rejected() {
        let mut draft = valid_draft();
        draft.full_name = "x".repeat(201);
        assert_eq!(validate_draft(&draft), Err(ValidationError::NameTooLong));
    }

    #[test]
    fn mobile_accepts_common_formats() {
        for mobile in ["9990001111", "+91 99900 01111", "(999) 000-1111"] {
            let mut draft = valid_draft();
            draft.mobile = mobile.into();
            assert_eq!(validate_draft(&draft), Ok(()), "rejected {mobile}");
        }
    }

    #[test]
    fn mobile_rejects_letters_and_short_numbers() {
        for mobile in ["not-a-number", "12345", "99900x1111"] {
            let mut draft = valid_draft();
            draft.mobile = mobile.into();
            assert!(validate_draft(&draft).is_err(), "accepted {mobile}");
        }
    }

    #[test]
    fn email_shape_is_checked() {
        for email in ["plainaddress", "a@b", "a b@x.com", "@x.com"] {
            let mut draft = valid_draft();
            draft.email = email.into();
            assert!(
                matches!(
                    validate_draft(&draft),
                    Err(ValidationError::InvalidEmail(_))
                ),
                "accepted {email}"
            );
        }
    }

    #[test]
    fn service_must_come_from_the_menu() {
        let mut draft = valid_draft();
        draft.service = "Telekinesis".into();
        assert_eq!(
            validate_draft(&draft),
            Err(ValidationError::UnknownService("Telekinesis".into()))
        );
    }

    #[test]
    fn every_menu_service_is_accepted() {
        for service in SERVICES {
            let mut draft = valid_draft();
            draft.service = service.to_string();
            assert_eq!(validate_draft(&draft), Ok(()), "rejected {service}");
        }
    }

    #[test]
    fn date_must_be_iso() {
        for date in ["03/01/2025", "2025-13-01", "2025-02-30", "tomorrow"] {
            let mut draft = valid_draft();
            draft.date = date.into();
            assert_eq!(validate_draft(&draft), Err(ValidationError::InvalidDate), "accepted {date}");
        }
    }

    #[test]
    fn time_must_be_a_known_slot() {
        let mut draft = valid_draft();
        draft.time = "10:15 AM".into();
        assert_eq!(
            validate_draft(&draft),
            Err(ValidationError::UnknownTimeSlot("10:15 AM".into()))
        );
    }

    #[test]
    fn lunch_break_slots_do_not_exist() {
        assert!(!TIME_SLOTS.contains(&"01:00 PM"));
        assert!(!TIME_SLOTS.contains(&"01:30 PM"));
        assert_eq!(TIME_SLOTS.len(), 18);
    }

    #[test]
    fn oversized_message_is_rejected() {
        let mut draft = valid_draft();
        draft.message = Some("m".repeat(2001));
        assert_eq!(validate_draft(&draft), Err(ValidationError::MessageTooLong));
    }

    // ── Submission ───────────────────────────────────────

    #[tokio::test]
    async fn submit_persists_pending_record() {
        let store = MemoryStore::new();
        let id = submit_appointment(&store, &valid_draft()).await.unwrap();
        assert!(!id.is_empty());

        let docs = store
            .query(config::APPOINTMENTS_COLLECTION, &[], None)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);

        let apt = Appointment::from_document(docs.into_iter().next().unwrap()).unwrap();
        assert_eq!(apt.id, id);
        assert_eq!(apt.status, AppointmentStatus::Pending);
        assert_eq!(apt.created_at, apt.updated_at);
        assert_eq!(apt.full_name, "Asha Verma");
    }

    #[tokio::test]
    async fn submit_trims_whitespace_and_drops_empty_message() {
        let store = MemoryStore::new();
        let draft = AppointmentDraft {
            full_name: "  Asha Verma  ".into(),
            message: Some("   ".into()),
            ..valid_draft()
        };
        submit_appointment(&store, &draft).await.unwrap();

        let docs = store
            .query(config::APPOINTMENTS_COLLECTION, &[], None)
            .await
            .unwrap();
        let apt = Appointment::from_document(docs.into_iter().next().unwrap()).unwrap();
        assert_eq!(apt.full_name, "Asha Verma");
        assert_eq!(apt.message, None);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_store() {
        let store = MemoryStore::new();
        let mut draft = valid_draft();
        draft.email = "not-an-email".into();

        let err = submit_appointment(&store, &draft).await.unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
        assert!(store.is_empty(config::APPOINTMENTS_COLLECTION));
    }
}
