//! CLI tool to create a project API key in DynamoDB
//!
//! Usage:
//!   cargo run --bin create_api_key -- --org-id org_1 --project-id proj_1 --note "CI"

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use hanzo_console_gateway::{
    config::{create_dynamodb_client, Settings},
    db::{ApiKeyRepository, DynamoDbClient, ProjectApiKey},
    identity::{display_secret_key, generate_key_pair, hash_secret_key},
};
use std::sync::Arc;

/// Create a new project API key in DynamoDB
#[derive(Parser, Debug)]
#[command(name = "create_api_key")]
#[command(about = "Create a new project API key in DynamoDB")]
struct Args {
    /// Organization the key is scoped to
    #[arg(long)]
    org_id: String,

    /// Project the key is scoped to
    #[arg(long)]
    project_id: String,

    /// Free-form note shown next to the key
    #[arg(short, long)]
    note: Option<String>,

    /// Expire the key after this many days
    #[arg(long)]
    expires_in_days: Option<i64>,

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

    let (public_key, secret_key) = generate_key_pair();
    let now = Utc::now();
    let key = ProjectApiKey {
        hashed_secret_key: hash_secret_key(&secret_key),
        public_key: public_key.clone(),
        display_secret_key: display_secret_key(&secret_key),
        org_id: args.org_id.clone(),
        project_id: args.project_id.clone(),
        note: args.note,
        created_at: now.timestamp(),
        expires_at: args
            .expires_in_days
            .map(|days| (now + Duration::days(days)).timestamp()),
        last_used_at: None,
        is_active: true,
    };

    repository
        .create(&key)
        .await
        .with_context(|| format!("Failed to write key to {}", settings.dynamodb_api_keys_table))?;

    println!("\nAPI key created. The secret key is shown only once.\n");
    println!("Public key:  {}", public_key);
    println!("Secret key:  {}", secret_key);
    println!("Org:         {}", args.org_id);
    println!("Project:     {}", args.project_id);
    if let Some(expires_at) = key.expires_at {
        println!("Expires at:  {}", expires_at);
    }
    println!("\nUse it with:");
    println!("  Authorization: Bearer {}", secret_key);

    Ok(())
}
