//! Console session tokens
//!
//! The console signs an HS256 JWT for each browser session with the shared
//! `NEXTAUTH_SECRET`. Only claims that the console pins after checking
//! membership (`orgId`, `projectId`) are treated as the active tenant.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::api_key::is_api_key_secret;
use super::IdentityError;

/// Allowed clock skew when checking `exp`
const LEEWAY_SECONDS: u64 = 60;

/// A membership entry carried in the session for display purposes.
///
/// Never used to pick a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgMembership {
    pub org_id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub project_ids: Vec<String>,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub organizations: Vec<OrgMembership>,
    pub exp: usize,
}

/// Verifies session tokens against the shared secret
#[derive(Clone)]
pub struct SessionDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDecoder").finish_non_exhaustive()
    }
}

impl SessionDecoder {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECONDS;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry and return the claims
    pub fn decode(&self, token: &str) -> Result<SessionClaims, IdentityError> {
        decode::<SessionClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| IdentityError::InvalidSession(e.to_string()))
    }
}

/// Find the session token on a request.
///
/// Cookies are checked first, in the configured order. A bearer token is
/// only treated as a session token when it is not an API key secret.
pub fn session_token_from_headers(headers: &HeaderMap, cookie_names: &[String]) -> Option<String> {
    for name in cookie_names {
        if let Some(value) = find_cookie(headers, name) {
            return Some(value);
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty() && !is_api_key_secret(token))
        .map(String::from)
}

fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
