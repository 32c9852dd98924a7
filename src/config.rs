use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Clinicdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collection holding patient appointment requests.
pub const APPOINTMENTS_COLLECTION: &str = "appointments";

/// Collection holding the doctor allowlist. Entries are provisioned
/// directly in the backend console; this crate only reads them.
pub const AUTHORIZED_DOCTORS_COLLECTION: &str = "authorized_doctors";

/// Dashboard auto-refresh period.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "clinicdesk=info"
}

/// Base URL of the hosted backend (document store + auth).
pub fn backend_url() -> String {
    std::env::var("CLINICDESK_BACKEND_URL")
        .unwrap_or_else(|_| "http://localhost:8787".to_string())
}

/// Project API key sent with every backend request, if configured.
pub fn backend_api_key() -> Option<String> {
    std::env::var("CLINICDESK_API_KEY").ok()
}
