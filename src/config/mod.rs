//! Configuration management module
//!
//! This module handles loading and validating gateway configuration
//! from environment variables and .env files.

pub mod aws;
pub mod settings;

pub use aws::{build_aws_config, create_dynamodb_client};
pub use settings::{
    ApiKeyConfig, Environment, ProxyConfig, SessionConfig, Settings, UpstreamsConfig,
};
