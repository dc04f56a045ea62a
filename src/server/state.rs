//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::{create_dynamodb_client, Settings};
use crate::db::{ApiKeyRepository, DynamoDbClient};
use crate::identity::{ApiKeyStore, IdentityResolver};
use crate::proxy::{ProxyService, Upstream, UpstreamTargets};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Cheap to clone. Nothing in here is specific to a tenant; per-request
/// identity is resolved in the handlers and never stored.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Resolves the caller of each request
    pub identity: IdentityResolver,

    /// Upstream forwarding
    pub proxy: ProxyService,

    /// API key table client, when API key auth is enabled
    pub dynamodb: Option<Arc<DynamoDbClient>>,

    /// `x-env` value for this deployment
    pub deployment_env: &'static str,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create the application state, connecting the DynamoDB key store when
    /// API key authentication is enabled.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let (dynamodb, store) = if settings.api_keys.enabled {
            tracing::debug!(
                region = %settings.aws_region,
                endpoint = ?settings.dynamodb_endpoint_url,
                table = %settings.dynamodb_api_keys_table,
                "Creating DynamoDB client for API keys"
            );
            let sdk_client = create_dynamodb_client(&settings).await;
            let dynamodb = Arc::new(DynamoDbClient::new(
                sdk_client,
                settings.dynamodb_api_keys_table.clone(),
            ));
            let store: Arc<dyn ApiKeyStore> = Arc::new(ApiKeyRepository::new(dynamodb.clone()));
            (Some(dynamodb), Some(store))
        } else {
            tracing::info!("API key authentication disabled");
            (None, None)
        };

        Self::from_parts(settings, store, dynamodb)
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        settings: Settings,
        store: Option<Arc<dyn ApiKeyStore>>,
        dynamodb: Option<Arc<DynamoDbClient>>,
    ) -> anyhow::Result<Self> {
        let identity = IdentityResolver::from_settings(&settings, store);

        let targets = UpstreamTargets::from_config(&settings.upstreams);
        let zt_credentials = settings
            .upstreams
            .zt_admin_username
            .clone()
            .zip(settings.upstreams.zt_admin_password.clone());
        let proxy = ProxyService::new(&settings.proxy, targets, zt_credentials)?;

        for upstream in Upstream::ALL {
            tracing::info!(
                upstream = %upstream,
                mount = upstream.mount_path(),
                configured = proxy.targets().is_configured(upstream),
                "Proxy route"
            );
        }
        if settings.session.secret.is_none() {
            tracing::warn!("NEXTAUTH_SECRET not set, session cookies will not be accepted");
        }

        let deployment_env = settings.deployment_env();
        let settings = Arc::new(settings);

        tracing::info!(deployment_env = deployment_env, "Application state initialized successfully");

        Ok(Self {
            settings,
            identity,
            proxy,
            dynamodb,
            deployment_env,
            start_time: Instant::now(),
        })
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
