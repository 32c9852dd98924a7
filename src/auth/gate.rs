//! Dashboard access gate.
//!
//! Three states: `Unauthenticated`, `Checking`, `Authenticated`.
//! `Checking` covers both the allowlist lookup and the provider
//! round-trip. The allowlist is always consulted first and on its own:
//! a valid password for an email that is not on the active allowlist
//! never reaches `Authenticated`, and any session the provider may
//! already hold for such an email is torn down.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config;
use crate::models::AuthorizedDoctor;
use crate::store::{DocumentStore, Filter, StoreError};

use super::provider::{AuthProvider, ProviderSession};
use super::AuthError;

// ─── Types ────────────────────────────────────────────────────────────────────

/// An authorized doctor with a verified provider session. Both checks
/// passed; holding one is what `Authenticated` means.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorSession {
    pub doctor: AuthorizedDoctor,
    pub session: ProviderSession,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    Unauthenticated,
    Checking,
    Authenticated(DoctorSession),
}

impl GateState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

// ─── Allowlist lookup ─────────────────────────────────────────────────────────

/// The active allowlist entry for an email, if there is one. Inactive
/// entries are filtered out by the query itself.
pub async fn find_authorized_doctor<S: DocumentStore>(
    store: &S,
    email: &str,
) -> Result<Option<AuthorizedDoctor>, StoreError> {
    let filters = [Filter::eq("email", email), Filter::eq("is_active", true)];
    let docs = store
        .query(config::AUTHORIZED_DOCTORS_COLLECTION, &filters, None)
        .await?;

    docs.into_iter()
        .next()
        .map(AuthorizedDoctor::from_document)
        .transpose()
}

// ─── The gate ─────────────────────────────────────────────────────────────────

pub struct DoctorGate<S, P> {
    store: Arc<S>,
    provider: Arc<P>,
    state: Mutex<GateState>,
}

impl<S: DocumentStore, P: AuthProvider> DoctorGate<S, P> {
    pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
        Self {
            store,
            provider,
            state: Mutex::new(GateState::Unauthenticated),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, GateState>, AuthError> {
        self.state.lock().map_err(|_| AuthError::LockPoisoned)
    }

    fn set_state(&self, next: GateState) -> Result<(), AuthError> {
        *self.lock()? = next;
        Ok(())
    }

    /// Snapshot of the current gate state.
    pub fn state(&self) -> GateState {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(GateState::Unauthenticated)
    }

    /// Full login flow for the dashboard.
    ///
    /// Allowlist first, credentials second. Each failure path lands
    /// back on `Unauthenticated` with the matching error; only both
    /// checks passing reaches `Authenticated`.
    pub async fn login(&self, email: &str, password: &str) -> Result<DoctorSession, AuthError> {
        self.set_state(GateState::Checking)?;

        let doctor = match find_authorized_doctor(self.store.as_ref(), email).await {
            Ok(Some(doctor)) => doctor,
            Ok(None) => {
                // this device may still hold a session from an earlier login
                self.terminate_provider_session().await;
                self.set_state(GateState::Unauthenticated)?;
                tracing::warn!(email = %email, "login rejected: not on the active allowlist");
                return Err(AuthError::NotAuthorized);
            }
            Err(error) => {
                self.set_state(GateState::Unauthenticated)?;
                return Err(error.into());
            }
        };

        let session = match self.provider.sign_in(email, password).await {
            Ok(session) => session,
            Err(error) => {
                self.set_state(GateState::Unauthenticated)?;
                return Err(error);
            }
        };

        let doctor_session = DoctorSession { doctor, session };
        self.set_state(GateState::Authenticated(doctor_session.clone()))?;
        tracing::info!(doctor = %doctor_session.doctor.name, "doctor signed in");
        Ok(doctor_session)
    }

    /// Explicit logout: tear down the provider session, then the gate.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        self.set_state(GateState::Unauthenticated)?;
        tracing::info!("doctor signed out");
        Ok(())
    }

    /// Reconcile the gate with a provider-side session change — a
    /// session restored at startup, or torn down from elsewhere. A
    /// restored session still has to pass the allowlist.
    pub async fn handle_session_change(
        &self,
        session: Option<ProviderSession>,
    ) -> Result<(), AuthError> {
        let Some(session) = session else {
            self.set_state(GateState::Unauthenticated)?;
            return Ok(());
        };

        match find_authorized_doctor(self.store.as_ref(), &session.email).await {
            Ok(Some(doctor)) => {
                self.set_state(GateState::Authenticated(DoctorSession { doctor, session }))?;
                Ok(())
            }
            Ok(None) => {
                self.terminate_provider_session().await;
                self.set_state(GateState::Unauthenticated)?;
                tracing::warn!(email = %session.email, "provider session for non-allowlisted email terminated");
                Err(AuthError::NotAuthorized)
            }
            Err(error) => {
                self.set_state(GateState::Unauthenticated)?;
                Err(error.into())
            }
        }
    }

    /// Follow the provider's session channel until it closes. The
    /// current value is processed immediately on entry, then every
    /// subsequent change.
    pub async fn run_session_listener(&self) {
        let mut rx = self.provider.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Err(error) = self.handle_session_change(current).await {
                tracing::warn!(%error, "session change rejected");
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    async fn terminate_provider_session(&self) {
        if let Err(error) = self.provider.sign_out().await {
            tracing::warn!(%error, "failed to terminate provider session");
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
