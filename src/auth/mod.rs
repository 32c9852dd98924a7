//! Doctor authentication.
//!
//! Two checks stand between the login form and the dashboard: the
//! doctor allowlist in the document store, then credential
//! verification with the hosted auth provider — in that order,
//! always. `provider` is the boundary to the hosted service, `gate`
//! is the state machine that enforces the order.

pub mod gate;
pub mod provider;
pub mod rest;

pub use gate::{DoctorGate, DoctorSession, GateState};
pub use provider::{AuthProvider, ProviderSession};
pub use rest::RestAuthProvider;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email missing from the allowlist, or present but inactive.
    #[error("You are not authorized to access the doctor dashboard")]
    NotAuthorized,

    /// The provider rejected the credentials. Carries the provider's
    /// message so the login form can show it verbatim.
    #[error("{0}")]
    Credentials(String),

    /// Transport or backend failure while talking to the provider.
    #[error("Authentication service error: {0}")]
    Provider(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal lock error")]
    LockPoisoned,
}
