//! Project API key authentication
//!
//! Keys come as a pair: a public key (`pk-hz-...`) and a secret key
//! (`sk-hz-...`). Clients send either `Basic base64(pk:sk)` or
//! `Bearer sk`. Only the SHA-256 of the secret is ever looked up.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::{ApiKeyError, ProjectApiKey};
use crate::utils::truncate_str;

use super::IdentityError;

pub const PUBLIC_KEY_PREFIX: &str = "pk-hz-";
pub const SECRET_KEY_PREFIX: &str = "sk-hz-";

/// Storage backing API key lookups
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn find_by_hashed_secret(
        &self,
        hashed_secret_key: &str,
    ) -> Result<Option<ProjectApiKey>, ApiKeyError>;

    /// Record that the key was accepted at `at` (unix seconds)
    async fn mark_used(&self, hashed_secret_key: &str, at: i64) -> Result<(), ApiKeyError>;
}

pub fn is_api_key_secret(value: &str) -> bool {
    value.starts_with(SECRET_KEY_PREFIX)
}

/// Lowercase hex SHA-256 of a secret key
pub fn hash_secret_key(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Masked form of a secret key safe to show in UIs and logs
pub fn display_secret_key(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}...{}", SECRET_KEY_PREFIX, tail)
}

/// Fresh `(public_key, secret_key)` pair
pub fn generate_key_pair() -> (String, String) {
    (
        format!("{}{}", PUBLIC_KEY_PREFIX, Uuid::new_v4().simple()),
        format!("{}{}", SECRET_KEY_PREFIX, Uuid::new_v4().simple()),
    )
}

/// Credentials presented on a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyCredentials {
    pub public_key: Option<String>,
    pub secret_key: String,
}

impl ApiKeyCredentials {
    /// Extract API key credentials from the `Authorization` header.
    ///
    /// Returns `Ok(None)` when the header is absent or carries something
    /// other than an API key (e.g. a session JWT).
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, IdentityError> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value.to_str().map_err(|_| {
            IdentityError::MalformedAuthorization("header is not valid ASCII".to_string())
        })?;

        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if is_api_key_secret(token) {
                return Ok(Some(Self {
                    public_key: None,
                    secret_key: token.to_string(),
                }));
            }
            return Ok(None);
        }

        if let Some(encoded) = value.strip_prefix("Basic ") {
            let decoded = STANDARD.decode(encoded.trim()).map_err(|_| {
                IdentityError::MalformedAuthorization("invalid base64 in basic auth".to_string())
            })?;
            let decoded = String::from_utf8(decoded).map_err(|_| {
                IdentityError::MalformedAuthorization("basic auth is not UTF-8".to_string())
            })?;
            let (public_key, secret_key) = decoded.split_once(':').ok_or_else(|| {
                IdentityError::MalformedAuthorization("basic auth missing ':'".to_string())
            })?;

            if !public_key.starts_with(PUBLIC_KEY_PREFIX) || !is_api_key_secret(secret_key) {
                return Err(IdentityError::MalformedAuthorization(
                    "basic auth does not carry a project key pair".to_string(),
                ));
            }

            return Ok(Some(Self {
                public_key: Some(public_key.to_string()),
                secret_key: secret_key.to_string(),
            }));
        }

        Ok(None)
    }
}

/// Resolves API key credentials to the key record, with a short-lived cache
#[derive(Clone)]
pub struct ApiKeyResolver {
    store: Arc<dyn ApiKeyStore>,
    // Only active keys are cached so a deactivated key stops working within one TTL
    cache: Cache<String, ProjectApiKey>,
}

impl ApiKeyResolver {
    pub fn new(store: Arc<dyn ApiKeyStore>, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(cache_ttl)
            .build();

        Self { store, cache }
    }

    /// Look up and validate the key behind `credentials`
    pub async fn resolve(
        &self,
        credentials: &ApiKeyCredentials,
    ) -> Result<ProjectApiKey, IdentityError> {
        let hashed = hash_secret_key(&credentials.secret_key);

        let key = match self.cache.get(&hashed).await {
            Some(key) => key,
            None => {
                let key = self
                    .store
                    .find_by_hashed_secret(&hashed)
                    .await
                    .map_err(|e| IdentityError::KeyStore(e.to_string()))?
                    .ok_or(IdentityError::InvalidApiKey)?;

                if key.is_active {
                    self.cache.insert(hashed.clone(), key.clone()).await;
                    self.spawn_mark_used(hashed.clone());
                }
                key
            }
        };

        if !key.is_active {
            return Err(IdentityError::InactiveApiKey);
        }
        if key.is_expired() {
            self.cache.invalidate(&hashed).await;
            return Err(IdentityError::ExpiredApiKey);
        }
        if let Some(public_key) = &credentials.public_key {
            if *public_key != key.public_key {
                tracing::warn!(
                    public_key = %truncate_str(public_key, 14),
                    "Public key does not match secret key"
                );
                return Err(IdentityError::InvalidApiKey);
            }
        }

        Ok(key)
    }

    fn spawn_mark_used(&self, hashed: String) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.mark_used(&hashed, Utc::now().timestamp()).await {
                tracing::debug!(error = %e, "Failed to record API key usage");
            }
        });
    }
}
