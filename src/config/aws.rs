//! AWS SDK configuration
//!
//! Builds the DynamoDB client backing the project API key store, with
//! support for a custom endpoint (DynamoDB Local, LocalStack).

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::Client as DynamoDbSdkClient;

use crate::config::Settings;

/// Load the shared SDK config for the configured region.
///
/// Credentials come from the default provider chain (env vars, profile,
/// instance metadata).
pub async fn build_aws_config(settings: &Settings) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(Region::new(settings.aws_region.clone()))
        .or_default_provider();

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// Create a DynamoDB client, honouring `DYNAMODB_ENDPOINT_URL`
pub async fn create_dynamodb_client(settings: &Settings) -> DynamoDbSdkClient {
    let sdk_config = build_aws_config(settings).await;

    match &settings.dynamodb_endpoint_url {
        Some(endpoint_url) => {
            tracing::info!(endpoint = %endpoint_url, "Using custom DynamoDB endpoint");

            let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint_url)
                .build();

            DynamoDbSdkClient::from_conf(dynamodb_config)
        }
        None => DynamoDbSdkClient::new(&sdk_config),
    }
}
