//! Boundary to the hosted authentication provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::AuthError;

/// An established session with the auth provider. Holding one proves
/// the credentials were verified; it says nothing about allowlisting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

/// Async boundary to the hosted auth service.
///
/// Implementations keep the current session observable through a
/// `watch` channel: a new receiver sees the current value immediately
/// and a change on every sign-in and sign-out, which is how the gate
/// notices sessions established or torn down elsewhere.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify credentials. Success establishes the provider session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError>;

    /// Terminate the current session, if any. Idempotent.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Observe session changes.
    fn subscribe(&self) -> watch::Receiver<Option<ProviderSession>>;
}
