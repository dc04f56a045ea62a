//! CLI tool to deactivate a project API key
//!
//! Usage:
//!   cargo run --bin revoke_api_key -- --secret-key sk-hz-...

use anyhow::{bail, Context, Result};
use clap::Parser;
use hanzo_console_gateway::{
    config::{create_dynamodb_client, Settings},
    db::{ApiKeyRepository, DynamoDbClient},
    identity::{hash_secret_key, SECRET_KEY_PREFIX},
};
use std::sync::Arc;

/// Deactivate a project API key
#[derive(Parser, Debug)]
#[command(name = "revoke_api_key")]
#[command(about = "Deactivate a project API key")]
struct Args {
    /// Secret key to revoke
    #[arg(long)]
    secret_key: String,

    /// DynamoDB table name (overrides DYNAMODB_API_KEYS_TABLE)
    #[arg(long)]
    table_name: Option<String>,

    /// DynamoDB endpoint URL (for local development)
    #[arg(long)]
    endpoint_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.secret_key.starts_with(SECRET_KEY_PREFIX) {
        bail!("secret key must start with {}", SECRET_KEY_PREFIX);
    }

    let mut settings = Settings::load().context("Failed to load configuration")?;
    if let Some(table) = args.table_name {
        settings.dynamodb_api_keys_table = table;
    }
    if args.endpoint_url.is_some() {
        settings.dynamodb_endpoint_url = args.endpoint_url;
    }

    let client = create_dynamodb_client(&settings).await;
    let repository = ApiKeyRepository::new(Arc::new(DynamoDbClient::new(
        client,
        settings.dynamodb_api_keys_table.clone(),
    )));

    repository
        .deactivate(&hash_secret_key(&args.secret_key))
        .await
        .context("Failed to deactivate key (it may not exist)")?;

    println!("API key deactivated. Cached copies expire within API_KEY_CACHE_TTL_SECONDS.");

    Ok(())
}
