//! DynamoDB data models
//!
//! This module defines the data structures stored in the API key table.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A project-scoped API key.
///
/// Stored in the api keys table with `hashed_secret_key` as partition key.
/// The plaintext secret is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectApiKey {
    /// SHA-256 hex digest of the secret key (partition key)
    pub hashed_secret_key: String,

    /// Public half of the key pair, format: pk-hz-{uuid}
    pub public_key: String,

    /// Masked secret for display, e.g. `sk-hz-...3f9a`
    pub display_secret_key: String,

    /// Organization that owns the project
    pub org_id: String,

    /// Project the key is scoped to
    pub project_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Unix timestamp when the key was created
    pub created_at: i64,

    /// Unix timestamp after which the key is rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<i64>,

    pub is_active: bool,
}

impl ProjectApiKey {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Parse from DynamoDB item
    pub fn from_dynamodb(item: &HashMap<String, AttributeValue>) -> Option<Self> {
        Some(Self {
            hashed_secret_key: get_string(item, "hashed_secret_key")?,
            public_key: get_string(item, "public_key")?,
            display_secret_key: get_string(item, "display_secret_key").unwrap_or_default(),
            org_id: get_string(item, "org_id")?,
            project_id: get_string(item, "project_id")?,
            note: get_string(item, "note"),
            created_at: get_number(item, "created_at").unwrap_or(0),
            expires_at: get_number(item, "expires_at"),
            last_used_at: get_number(item, "last_used_at"),
            is_active: get_bool(item, "is_active").unwrap_or(false),
        })
    }

    /// Convert to a DynamoDB item
    pub fn to_dynamodb(&self) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            "hashed_secret_key".to_string(),
            AttributeValue::S(self.hashed_secret_key.clone()),
        );
        item.insert("public_key".to_string(), AttributeValue::S(self.public_key.clone()));
        item.insert(
            "display_secret_key".to_string(),
            AttributeValue::S(self.display_secret_key.clone()),
        );
        item.insert("org_id".to_string(), AttributeValue::S(self.org_id.clone()));
        item.insert("project_id".to_string(), AttributeValue::S(self.project_id.clone()));
        if let Some(note) = &self.note {
            item.insert("note".to_string(), AttributeValue::S(note.clone()));
        }
        item.insert("created_at".to_string(), AttributeValue::N(self.created_at.to_string()));
        if let Some(expires_at) = self.expires_at {
            item.insert("expires_at".to_string(), AttributeValue::N(expires_at.to_string()));
        }
        if let Some(last_used_at) = self.last_used_at {
            item.insert("last_used_at".to_string(), AttributeValue::N(last_used_at.to_string()));
        }
        item.insert("is_active".to_string(), AttributeValue::Bool(self.is_active));
        item
    }
}

fn get_string(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

fn get_number(item: &HashMap<String, AttributeValue>, key: &str) -> Option<i64> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

fn get_bool(item: &HashMap<String, AttributeValue>, key: &str) -> Option<bool> {
    item.get(key).and_then(|v| v.as_bool().ok()).copied()
}
