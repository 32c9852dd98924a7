//! Clinicdesk — the transactional core behind a small clinic's website.
//!
//! Two flows over one shared collection: patients submit appointment
//! requests through `intake`, and an authorized doctor reviews them
//! through `dashboard` after passing the `auth` gate. All records live
//! in a hosted document database reached through the `store` boundary;
//! this crate keeps no data of its own.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod intake;
pub mod models;
pub mod store;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the embedding shell (desktop app, tests,
/// one-off tools). Reads `RUST_LOG` with a crate default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Clinicdesk core v{}", config::APP_VERSION);
}
