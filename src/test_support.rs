//! Shared helpers for unit tests

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::db::{ApiKeyError, ProjectApiKey};
use crate::identity::{display_secret_key, hash_secret_key, ApiKeyStore, SessionClaims};

/// API key store held in memory
#[derive(Default)]
pub struct InMemoryApiKeyStore {
    keys: Mutex<HashMap<String, ProjectApiKey>>,
    lookups: AtomicUsize,
    fail: bool,
}

impl InMemoryApiKeyStore {
    /// A store whose every lookup errors
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, key: ProjectApiKey) {
        self.keys
            .lock()
            .unwrap()
            .insert(key.hashed_secret_key.clone(), key);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn find_by_hashed_secret(
        &self,
        hashed_secret_key: &str,
    ) -> Result<Option<ProjectApiKey>, ApiKeyError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ApiKeyError::DynamoDb("connection refused".to_string()));
        }
        Ok(self.keys.lock().unwrap().get(hashed_secret_key).cloned())
    }

    async fn mark_used(&self, hashed_secret_key: &str, at: i64) -> Result<(), ApiKeyError> {
        let mut keys = self.keys.lock().unwrap();
        let key = keys.get_mut(hashed_secret_key).ok_or(ApiKeyError::NotFound)?;
        key.last_used_at = Some(at);
        Ok(())
    }
}

/// An active key with the given pair and scope
pub fn project_key(public_key: &str, secret_key: &str, org_id: &str, project_id: &str) -> ProjectApiKey {
    ProjectApiKey {
        hashed_secret_key: hash_secret_key(secret_key),
        public_key: public_key.to_string(),
        display_secret_key: display_secret_key(secret_key),
        org_id: org_id.to_string(),
        project_id: project_id.to_string(),
        note: None,
        created_at: Utc::now().timestamp(),
        expires_at: None,
        last_used_at: None,
        is_active: true,
    }
}

/// Session claims valid for one hour
pub fn session_claims(user_id: &str, org_id: Option<&str>, project_id: Option<&str>) -> SessionClaims {
    SessionClaims {
        sub: user_id.to_string(),
        email: Some(format!("{}@example.com", user_id)),
        name: None,
        org_id: org_id.map(String::from),
        project_id: project_id.map(String::from),
        organizations: Vec::new(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    }
}

/// Sign claims the way the console does (HS256)
pub fn sign_session(claims: &SessionClaims, secret: &str) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}
