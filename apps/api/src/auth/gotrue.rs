//! HTTP client for a GoTrue-compatible auth service (the hosted backend's
//! `/auth/v1` endpoints).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{AdminUser, AuthError, AuthProvider, Session};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// The service reports errors under a handful of different keys.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self, fallback: String) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or(fallback)
    }
}

#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Sends the request, retrying network failures and 5xx answers with
    /// exponential backoff. 4xx answers are returned to the caller untouched.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, AuthError> {
        let mut last_error = String::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(250 * (1 << (attempt - 1)));
                warn!(
                    "Auth call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match build().header("apikey", &self.anon_key).send().await {
                Ok(response) if response.status().is_server_error() => {
                    last_error = format!("status {}", response.status());
                }
                Ok(response) => return Ok(response),
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(AuthError::Unavailable(last_error))
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .unwrap_or_default()
        .into_message(format!("auth service returned {status}"))
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = self.endpoint("token?grant_type=password");
        let grant = PasswordGrant { email, password };
        let response = self.send(|| self.client.post(&url).json(&grant)).await?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected(error_message(response).await));
        }
        let session: Session = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("malformed session: {e}")))?;
        debug!("Password grant succeeded for user {}", session.user.id);
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("logout");
        let response = self
            .send(|| self.client.post(&url).bearer_auth(access_token))
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Signing out an already-dead session is not an error.
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(AuthError::Rejected(error_message(response).await)),
        }
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<AdminUser>, AuthError> {
        let url = self.endpoint("user");
        let response = self
            .send(|| self.client.get(&url).bearer_auth(access_token))
            .await?;

        match response.status() {
            status if status.is_success() => response
                .json::<AdminUser>()
                .await
                .map(Some)
                .map_err(|e| AuthError::Unavailable(format!("malformed user: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(AuthError::Rejected(error_message(response).await)),
        }
    }
}
