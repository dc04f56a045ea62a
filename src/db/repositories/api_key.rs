//! API key repository
//!
//! Data access layer for project API keys.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::sync::Arc;

use crate::db::models::ProjectApiKey;
use crate::db::DynamoDbClient;
use crate::identity::ApiKeyStore;

/// Repository for API key operations
#[derive(Clone)]
pub struct ApiKeyRepository {
    client: Arc<DynamoDbClient>,
}

impl ApiKeyRepository {
    /// Create a new API key repository
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self { client }
    }

    /// Get an API key by the hash of its secret
    pub async fn get_by_hashed_secret(
        &self,
        hashed_secret_key: &str,
    ) -> Result<Option<ProjectApiKey>, ApiKeyError> {
        let result = self
            .client
            .client()
            .get_item()
            .table_name(self.client.api_keys_table())
            .key("hashed_secret_key", AttributeValue::S(hashed_secret_key.to_string()))
            .send()
            .await
            .map_err(|e| ApiKeyError::DynamoDb(e.to_string()))?;

        let Some(item) = result.item else {
            return Ok(None);
        };

        ProjectApiKey::from_dynamodb(&item)
            .map(Some)
            .ok_or_else(|| ApiKeyError::ParseError("Failed to parse API key".to_string()))
    }

    /// Store a newly created key. Fails if the hash already exists.
    pub async fn create(&self, key: &ProjectApiKey) -> Result<(), ApiKeyError> {
        self.client
            .client()
            .put_item()
            .table_name(self.client.api_keys_table())
            .set_item(Some(key.to_dynamodb()))
            .condition_expression("attribute_not_exists(hashed_secret_key)")
            .send()
            .await
            .map_err(|e| ApiKeyError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    /// Record the time a key was last accepted
    pub async fn touch_last_used(
        &self,
        hashed_secret_key: &str,
        at: i64,
    ) -> Result<(), ApiKeyError> {
        self.client
            .client()
            .update_item()
            .table_name(self.client.api_keys_table())
            .key("hashed_secret_key", AttributeValue::S(hashed_secret_key.to_string()))
            .update_expression("SET last_used_at = :at")
            .condition_expression("attribute_exists(hashed_secret_key)")
            .expression_attribute_values(":at", AttributeValue::N(at.to_string()))
            .send()
            .await
            .map_err(|e| ApiKeyError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    /// Deactivate an API key
    pub async fn deactivate(&self, hashed_secret_key: &str) -> Result<(), ApiKeyError> {
        self.client
            .client()
            .update_item()
            .table_name(self.client.api_keys_table())
            .key("hashed_secret_key", AttributeValue::S(hashed_secret_key.to_string()))
            .update_expression("SET is_active = :inactive")
            .condition_expression("attribute_exists(hashed_secret_key)")
            .expression_attribute_values(":inactive", AttributeValue::Bool(false))
            .send()
            .await
            .map_err(|e| ApiKeyError::DynamoDb(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ApiKeyStore for ApiKeyRepository {
    async fn find_by_hashed_secret(
        &self,
        hashed_secret_key: &str,
    ) -> Result<Option<ProjectApiKey>, ApiKeyError> {
        self.get_by_hashed_secret(hashed_secret_key).await
    }

    async fn mark_used(&self, hashed_secret_key: &str, at: i64) -> Result<(), ApiKeyError> {
        self.touch_last_used(hashed_secret_key, at).await
    }
}

/// Errors that can occur during API key operations
#[derive(Debug, thiserror::Error)]
pub enum ApiKeyError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("API key not found")]
    NotFound,

    #[error("Parse error: {0}")]
    ParseError(String),
}
