//! DynamoDB client wrapper
//!
//! This module provides a wrapper around the AWS DynamoDB SDK client
//! for the API key table.

use aws_sdk_dynamodb::Client as DynamoDbSdkClient;

/// DynamoDB client wrapper for database operations.
#[derive(Clone)]
pub struct DynamoDbClient {
    /// AWS DynamoDB SDK client
    client: DynamoDbSdkClient,

    api_keys_table: String,
}

impl DynamoDbClient {
    /// Create a new DynamoDB client.
    ///
    /// # Arguments
    /// * `client` - AWS DynamoDB SDK client
    /// * `api_keys_table` - Name of the project API key table
    pub fn new(client: DynamoDbSdkClient, api_keys_table: impl Into<String>) -> Self {
        Self {
            client,
            api_keys_table: api_keys_table.into(),
        }
    }

    /// Get a reference to the underlying AWS SDK client
    pub fn client(&self) -> &DynamoDbSdkClient {
        &self.client
    }

    /// Get the API keys table name
    pub fn api_keys_table(&self) -> &str {
        &self.api_keys_table
    }

    /// Check if the DynamoDB connection is healthy
    ///
    /// Performs a simple list_tables operation to verify connectivity.
    pub async fn health_check(&self) -> bool {
        match self.client.list_tables().limit(1).send().await {
            Ok(_) => {
                tracing::debug!("DynamoDB health check passed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "DynamoDB health check failed");
                false
            }
        }
    }
}
