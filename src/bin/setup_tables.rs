//! CLI tool to create the API key table
//!
//! Usage:
//!   cargo run --bin setup_tables
//!
//! For local development with DynamoDB Local:
//!   DYNAMODB_ENDPOINT_URL=http://localhost:8001 cargo run --bin setup_tables

use anyhow::{Context, Result};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use clap::Parser;
use hanzo_console_gateway::config::{create_dynamodb_client, Settings};

/// Create the DynamoDB table backing project API keys
#[derive(Parser, Debug)]
#[command(name = "setup_tables")]
#[command(about = "Create the DynamoDB table backing project API keys")]
struct Args {
    /// DynamoDB endpoint URL (for local development)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Table name (overrides DYNAMODB_API_KEYS_TABLE)
    #[arg(long)]
    table_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load().context("Failed to load configuration")?;
    if let Some(table) = args.table_name {
        settings.dynamodb_api_keys_table = table;
    }
    if let Some(url) = args.endpoint_url {
        println!("Using DynamoDB endpoint: {}", url);
        settings.dynamodb_endpoint_url = Some(url);
    }

    let client = create_dynamodb_client(&settings).await;
    let table_name = &settings.dynamodb_api_keys_table;

    match create_api_keys_table(&client, table_name).await {
        Ok(true) => println!("Created table: {}", table_name),
        Ok(false) => println!("Table already exists: {}", table_name),
        Err(e) => {
            println!("Failed to create table {}: {:#}", table_name, e);
            return Err(e);
        }
    }

    Ok(())
}

async fn create_api_keys_table(client: &aws_sdk_dynamodb::Client, table_name: &str) -> Result<bool> {
    let tables = client.list_tables().send().await?;
    if tables.table_names().iter().any(|name| name == table_name) {
        return Ok(false);
    }

    client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("hashed_secret_key")
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("hashed_secret_key")
                .key_type(KeyType::Hash)
                .build()?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await?;

    Ok(true)
}
