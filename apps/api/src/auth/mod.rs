//! Admin authentication.
//!
//! Credentials and sessions live in the hosted auth service; this module only
//! talks to it through [`AuthProvider`], broadcasts sign-in/sign-out events and
//! guards the admin routes with a bearer-token middleware.

pub mod gotrue;
pub mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

const AUTH_EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AdminUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AdminUser),
    SignedOut,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The service answered and refused (bad credentials, expired token).
    #[error("{0}")]
    Rejected(String),

    /// The service could not be reached or failed.
    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected(msg) => AppError::Unauthorized(msg),
            AuthError::Unavailable(msg) => AppError::dependency("Auth service unavailable", msg),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// `Ok(None)` when the token is not (or no longer) valid.
    async fn current_user(&self, access_token: &str) -> Result<Option<AdminUser>, AuthError>;
}

/// Wraps an [`AuthProvider`] and publishes auth-state changes to subscribers.
pub struct AuthGateway {
    provider: Arc<dyn AuthProvider>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthGateway {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { provider, events }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        info!("Admin signed in: {}", session.user.id);
        // No subscribers is fine.
        let _ = self.events.send(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.provider.sign_out(access_token).await?;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    pub async fn current_user(&self, access_token: &str) -> Result<Option<AdminUser>, AuthError> {
        self.provider.current_user(access_token).await
    }

    /// Subscribes to future sign-in/sign-out events.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Middleware for admin routes: resolves the bearer token to a user and makes
/// it available to handlers as an `Extension<AdminUser>`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?
        .to_string();

    let user = state
        .auth
        .current_user(&token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session is invalid or expired".to_string()))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
