//! Server-side identity resolution
//!
//! Turns the credentials on an inbound request (console session cookie,
//! session bearer token, or project API key) into the caller's identity.
//! The active org and project are only ever taken from values that were
//! explicitly pinned: the `orgId`/`projectId` session claims or the scope
//! of an API key. Membership lists are never used to pick a tenant.

pub mod api_key;
pub mod session;

use axum::http::{header, HeaderMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Settings;

pub use api_key::{
    display_secret_key, generate_key_pair, hash_secret_key, ApiKeyCredentials, ApiKeyResolver,
    ApiKeyStore, PUBLIC_KEY_PREFIX, SECRET_KEY_PREFIX,
};
pub use session::{session_token_from_headers, OrgMembership, SessionClaims, SessionDecoder};

/// How the caller authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Session,
    ApiKey,
}

/// The authenticated caller of a single request
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub actor_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
    pub organizations: Vec<OrgMembership>,
    pub source: IdentitySource,
}

impl Identity {
    /// Build a session identity, keeping the pins only when they agree with
    /// the membership data carried alongside them.
    pub fn from_session(claims: SessionClaims) -> Self {
        let (org_id, project_id) = checked_pins(
            &claims.sub,
            non_empty(claims.org_id),
            non_empty(claims.project_id),
            &claims.organizations,
        );

        Self {
            actor_id: claims.sub,
            org_id,
            project_id,
            organizations: claims.organizations,
            source: IdentitySource::Session,
        }
    }

    pub fn from_api_key(key: &crate::db::ProjectApiKey) -> Self {
        Self {
            actor_id: format!("api-key:{}", key.public_key),
            org_id: non_empty(Some(key.org_id.clone())),
            project_id: non_empty(Some(key.project_id.clone())),
            organizations: Vec::new(),
            source: IdentitySource::ApiKey,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn checked_pins(
    actor_id: &str,
    org_id: Option<String>,
    project_id: Option<String>,
    organizations: &[OrgMembership],
) -> (Option<String>, Option<String>) {
    let Some(org_id) = org_id else {
        if project_id.is_some() {
            tracing::warn!(actor_id = %actor_id, "Session pins a project without an org, ignoring pin");
        }
        return (None, None);
    };

    if organizations.is_empty() {
        return (Some(org_id), project_id);
    }

    let Some(membership) = organizations.iter().find(|m| m.org_id == org_id) else {
        tracing::warn!(
            actor_id = %actor_id,
            org_id = %org_id,
            "Pinned org is not among the session memberships, ignoring pin"
        );
        return (None, None);
    };

    if let Some(project_id) = &project_id {
        if !membership.project_ids.is_empty() && !membership.project_ids.contains(project_id) {
            tracing::warn!(
                actor_id = %actor_id,
                org_id = %org_id,
                project_id = %project_id,
                "Pinned project does not belong to pinned org, ignoring pin"
            );
            return (None, None);
        }
    }

    (Some(org_id), project_id)
}

/// Reasons an identity could not be established
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("session authentication is not configured")]
    SessionsDisabled,

    #[error("invalid session token: {0}")]
    InvalidSession(String),

    #[error("malformed authorization header: {0}")]
    MalformedAuthorization(String),

    #[error("API key authentication is disabled")]
    ApiKeysDisabled,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("API key is inactive")]
    InactiveApiKey,

    #[error("API key has expired")]
    ExpiredApiKey,

    #[error("API key store error: {0}")]
    KeyStore(String),
}

/// Resolves the identity of a request from its headers
#[derive(Clone)]
pub struct IdentityResolver {
    sessions: Option<SessionDecoder>,
    cookie_names: Arc<Vec<String>>,
    api_keys: Option<ApiKeyResolver>,
}

impl IdentityResolver {
    pub fn new(
        sessions: Option<SessionDecoder>,
        cookie_names: Vec<String>,
        api_keys: Option<ApiKeyResolver>,
    ) -> Self {
        Self {
            sessions,
            cookie_names: Arc::new(cookie_names),
            api_keys,
        }
    }

    /// Build from settings. API keys are only accepted when enabled and a
    /// key store is available.
    pub fn from_settings(settings: &Settings, store: Option<Arc<dyn ApiKeyStore>>) -> Self {
        let sessions = settings.session.secret.as_deref().map(SessionDecoder::new);
        let api_keys = store
            .filter(|_| settings.api_keys.enabled)
            .map(|store| {
                ApiKeyResolver::new(store, Duration::from_secs(settings.api_keys.cache_ttl_seconds))
            });

        Self::new(sessions, settings.session.cookie_names.clone(), api_keys)
    }

    /// Resolve the caller.
    ///
    /// `Ok(None)` means the request carried no credentials at all.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, IdentityError> {
        if let Some(credentials) = ApiKeyCredentials::from_headers(headers)? {
            let resolver = self.api_keys.as_ref().ok_or(IdentityError::ApiKeysDisabled)?;
            let key = resolver.resolve(&credentials).await?;
            return Ok(Some(Identity::from_api_key(&key)));
        }

        if let Some(token) = session_token_from_headers(headers, &self.cookie_names) {
            let decoder = self.sessions.as_ref().ok_or(IdentityError::SessionsDisabled)?;
            let claims = decoder.decode(&token)?;
            return Ok(Some(Identity::from_session(claims)));
        }

        Ok(None)
    }

    /// Whether the `Authorization` header carries a console credential: a
    /// project API key or a session token this gateway can verify. Such a
    /// header must not reach downstream services.
    pub fn is_console_credential(&self, headers: &HeaderMap) -> bool {
        match ApiKeyCredentials::from_headers(headers) {
            Ok(Some(_)) => return true,
            Ok(None) => {}
            // Unparseable Basic auth is left to the upstream
            Err(_) => return false,
        }

        let Some(sessions) = &self.sessions else {
            return false;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .is_some_and(|token| sessions.decode(token).is_ok())
    }
}
