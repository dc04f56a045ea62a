//! Application settings and configuration
//!
//! This module provides configuration management for the gateway,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// Session token verification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// HMAC secret shared with the console that signs session tokens.
    /// Session authentication is disabled when unset.
    #[serde(skip_serializing)]
    pub secret: Option<String>,

    /// Cookie names checked in order for a session token
    pub cookie_names: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            cookie_names: default_cookie_names(),
        }
    }
}

/// Project API key authentication
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiKeyConfig {
    pub enabled: bool,
    pub cache_ttl_seconds: u64,
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_ttl_seconds: 60,
        }
    }
}

/// Reverse proxy behaviour shared by every upstream
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Time allowed for the upstream to return a response head
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Largest request body that will be forwarded
    pub max_body_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Base URLs and credentials of the services behind the proxy routes
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpstreamsConfig {
    pub kms_api_url: Option<String>,
    #[serde(skip_serializing)]
    pub kms_service_token: Option<String>,

    /// Compute (casvisor) service
    pub compute_api_url: Option<String>,

    pub agents_api_url: Option<String>,

    /// Zero-Trust controller management API
    pub zt_api_url: Option<String>,
    pub zt_admin_username: Option<String>,
    #[serde(skip_serializing)]
    pub zt_admin_password: Option<String>,
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    /// Deployment region, e.g. `US`, `EU`, `STAGING`, `DEV`
    pub cloud_region: Option<String>,

    // AWS settings (API key store)
    pub aws_region: String,
    pub dynamodb_endpoint_url: Option<String>,
    pub dynamodb_api_keys_table: String,

    // Authentication
    pub session: SessionConfig,
    pub api_keys: ApiKeyConfig,

    // Proxy
    pub proxy: ProxyConfig,
    pub upstreams: UpstreamsConfig,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            // App settings
            app_name: env_or_default("APP_NAME", "hanzo-console-gateway"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            // Server settings
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8080")
                .parse()
                .context("Invalid PORT value")?,

            cloud_region: env_non_empty("HANZO_CLOUD_REGION")
                .or_else(|| env_non_empty("NEXT_PUBLIC_HANZO_CLOUD_REGION")),

            // AWS settings
            aws_region: env_or_default("AWS_REGION", "us-east-1"),
            dynamodb_endpoint_url: env_non_empty("DYNAMODB_ENDPOINT_URL"),
            dynamodb_api_keys_table: env_or_default(
                "DYNAMODB_API_KEYS_TABLE",
                "hanzo-console-api-keys",
            ),

            // Authentication
            session: SessionConfig {
                secret: env_non_empty("NEXTAUTH_SECRET"),
                cookie_names: env_non_empty("SESSION_COOKIE_NAMES")
                    .map(|names| {
                        names
                            .split(',')
                            .map(str::trim)
                            .filter(|n| !n.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_else(default_cookie_names),
            },
            api_keys: ApiKeyConfig {
                enabled: env_or_default("API_KEY_AUTH_ENABLED", "true")
                    .parse()
                    .unwrap_or(true),
                cache_ttl_seconds: env_or_default("API_KEY_CACHE_TTL_SECONDS", "60")
                    .parse()
                    .unwrap_or(60),
            },

            // Proxy
            proxy: ProxyConfig {
                request_timeout_ms: env_or_default("PROXY_TIMEOUT_MS", "30000")
                    .parse()
                    .context("Invalid PROXY_TIMEOUT_MS value")?,
                connect_timeout_ms: env_or_default("PROXY_CONNECT_TIMEOUT_MS", "10000")
                    .parse()
                    .context("Invalid PROXY_CONNECT_TIMEOUT_MS value")?,
                max_body_bytes: env_or_default("PROXY_MAX_BODY_BYTES", "10485760")
                    .parse()
                    .context("Invalid PROXY_MAX_BODY_BYTES value")?,
            },
            upstreams: UpstreamsConfig {
                kms_api_url: env_non_empty("KMS_API_URL"),
                kms_service_token: env_non_empty("KMS_SERVICE_TOKEN"),
                compute_api_url: env_non_empty("CASVISOR_API_URL"),
                agents_api_url: env_non_empty("AGENTS_API_URL"),
                zt_api_url: env_non_empty("ZT_API_URL"),
                zt_admin_username: env_non_empty("ZT_ADMIN_USERNAME"),
                zt_admin_password: env_non_empty("ZT_ADMIN_PASSWORD"),
            },
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.proxy.request_timeout_ms == 0 {
            anyhow::bail!("PROXY_TIMEOUT_MS must be > 0");
        }
        if self.proxy.max_body_bytes == 0 {
            anyhow::bail!("PROXY_MAX_BODY_BYTES must be > 0");
        }

        let upstream_urls = [
            ("KMS_API_URL", &self.upstreams.kms_api_url),
            ("CASVISOR_API_URL", &self.upstreams.compute_api_url),
            ("AGENTS_API_URL", &self.upstreams.agents_api_url),
            ("ZT_API_URL", &self.upstreams.zt_api_url),
        ];
        for (name, url) in upstream_urls {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("{} must be an http(s) URL, got {}", name, url);
                }
            }
        }

        if self.is_production() && self.session.secret.is_none() {
            tracing::warn!("Running in production without NEXTAUTH_SECRET, session authentication is disabled");
        }

        Ok(())
    }

    /// Value sent downstream as `x-env`.
    ///
    /// Derived once from the deployment region so every request from this
    /// process carries the same value.
    pub fn deployment_env(&self) -> &'static str {
        match self.cloud_region.as_deref().map(str::trim) {
            None | Some("") => "local",
            Some(region) if region.eq_ignore_ascii_case("DEV") => "dev",
            Some(region) if region.eq_ignore_ascii_case("STAGING") => "staging",
            Some(_) => "prod",
        }
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "hanzo-console-gateway".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            cloud_region: None,
            aws_region: "us-east-1".to_string(),
            dynamodb_endpoint_url: None,
            dynamodb_api_keys_table: "hanzo-console-api-keys".to_string(),
            session: SessionConfig::default(),
            api_keys: ApiKeyConfig::default(),
            proxy: ProxyConfig::default(),
            upstreams: UpstreamsConfig::default(),
        }
    }
}

fn default_cookie_names() -> Vec<String> {
    vec![
        "__Secure-next-auth.session-token".to_string(),
        "next-auth.session-token".to_string(),
    ]
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Environment variable that is set and not blank
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
