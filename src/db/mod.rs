//! Database module
//!
//! Contains the DynamoDB client and the project API key repository.

pub mod dynamodb;
pub mod models;
pub mod repositories;

pub use dynamodb::DynamoDbClient;
pub use models::ProjectApiKey;
pub use repositories::{ApiKeyError, ApiKeyRepository};
