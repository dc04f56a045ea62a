//! Repository pattern implementations
//!
//! Data access objects for DynamoDB tables.

pub mod api_key;

pub use api_key::{ApiKeyError, ApiKeyRepository};
