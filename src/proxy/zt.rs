//! Zero-Trust controller session
//!
//! The controller's management API wants a `zt-session` token obtained by
//! password login. The gateway logs in with the admin account, caches the
//! token and shares it across requests.

use moka::future::Cache;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Header carrying the controller session token
pub const ZT_SESSION_HEADER: &str = "zt-session";

/// Controller sessions expire after 30 minutes of inactivity
const TOKEN_TTL: Duration = Duration::from_secs(25 * 60);

/// Login deadline unless the proxy sets its own
const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

const CACHE_KEY: &str = "admin";

#[derive(Error, Debug)]
pub enum ZtError {
    #[error("Zero-Trust login request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zero-Trust login rejected with status {0}")]
    Rejected(u16),

    #[error("Zero-Trust login response had no token")]
    MissingToken,
}

impl ZtError {
    /// Whether the controller failed to answer before the login deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, ZtError::Http(e) if e.is_timeout())
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    data: Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
    token: Option<String>,
}

/// Caches the admin session token for the controller
#[derive(Clone)]
pub struct ZtSessionManager {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    login_timeout: Duration,
    tokens: Cache<&'static str, String>,
}

impl ZtSessionManager {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            tokens: Cache::builder()
                .max_capacity(1)
                .time_to_live(TOKEN_TTL)
                .build(),
        }
    }

    /// Bound each login request to `timeout`
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Current session token, logging in if there is none.
    ///
    /// Concurrent callers share a single login.
    pub async fn token(&self) -> Result<String, Arc<ZtError>> {
        self.tokens
            .try_get_with(CACHE_KEY, self.login())
            .await
    }

    /// Drop the cached token after the controller rejected it
    pub async fn invalidate(&self) {
        self.tokens.invalidate(CACHE_KEY).await;
    }

    async fn login(&self) -> Result<String, ZtError> {
        let url = format!("{}/authenticate?method=password", self.base_url.trim_end_matches('/'));
        tracing::debug!(url = %url, "Logging in to Zero-Trust controller");

        let response = self
            .client
            .post(&url)
            .timeout(self.login_timeout)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Zero-Trust controller rejected login");
            return Err(ZtError::Rejected(status.as_u16()));
        }

        let body: LoginResponse = response.json().await?;
        let token = body
            .data
            .and_then(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or(ZtError::MissingToken)?;

        tracing::info!("Obtained Zero-Trust controller session");
        Ok(token)
    }
}
