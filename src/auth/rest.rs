//! REST client for the hosted authentication provider.
//!
//! - `POST {base}/v1/auth/sign_in`  `{email, password}` → session
//! - `POST {base}/v1/auth/sign_out` (bearer token)
//!
//! The current session is mirrored into a `watch` channel so the gate
//! can react to sign-ins and sign-outs wherever they originate.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config;

use super::provider::{AuthProvider, ProviderSession};
use super::AuthError;

pub struct RestAuthProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    session_tx: watch::Sender<Option<ProviderSession>>,
}

impl RestAuthProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let (session_tx, _) = watch::channel(None);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            session_tx,
        }
    }

    /// Provider configured from `CLINICDESK_BACKEND_URL` / `CLINICDESK_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(&config::backend_url(), config::backend_api_key())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/v1/auth/{}", self.base_url, endpoint)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }

    fn current_session(&self) -> Option<ProviderSession> {
        self.session_tx.borrow().clone()
    }
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SignInResponse {
    user_id: String,
    email: String,
    access_token: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Pull the provider's message out of an error body, falling back to
/// a generic line when the body is not the documented shape.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| "Failed to sign in".to_string())
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError> {
        let body = SignInRequest { email, password };
        let response = self
            .authorize(self.client.post(self.auth_url("sign_in")).json(&body))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Credentials(error_message(&body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!("{}: {}", status.as_u16(), body)));
        }

        let signed_in: SignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        let session = ProviderSession {
            user_id: signed_in.user_id,
            email: signed_in.email,
            access_token: signed_in.access_token,
        };

        self.session_tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.current_session();

        // local teardown happens regardless of the revoke call below
        self.session_tx.send_replace(None);

        if let Some(session) = session {
            let response = self
                .authorize(self.client.post(self.auth_url("sign_out")))
                .bearer_auth(&session.access_token)
                .send()
                .await
                .map_err(|e| AuthError::Provider(e.to_string()))?;

            let status = response.status();
            // an already-expired token is still a successful sign-out
            if !status.is_success() && status != reqwest::StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                return Err(AuthError::Provider(format!("{}: {}", status.as_u16(), body)));
            }
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<ProviderSession>> {
        self.session_tx.subscribe()
    }
}
