//! Health check endpoints
//!
//! Probes for monitoring and container orchestration (Kubernetes, ECS, etc.)

use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::proxy::Upstream;
use crate::server::state::AppState;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    /// Value sent upstream as `x-env`
    pub deployment_env: String,
    pub uptime_seconds: u64,
}

/// Response for readiness probe
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub config_loaded: bool,
    /// Whether each upstream has a base URL
    pub upstreams: BTreeMap<&'static str, bool>,
    /// `None` when API key auth is disabled
    pub dynamodb: Option<bool>,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        deployment_env: state.deployment_env.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Readiness probe endpoint
///
/// Always 200 once the config is loaded. An unconfigured upstream only
/// affects its own routes, which answer 503.
///
/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let upstreams = Upstream::ALL
        .into_iter()
        .map(|u| (u.name(), state.proxy.targets().is_configured(u)))
        .collect();

    let dynamodb = match &state.dynamodb {
        Some(db) => Some(db.health_check().await),
        None => None,
    };

    let checks = ReadinessChecks {
        config_loaded: true,
        upstreams,
        dynamodb,
    };

    if checks.dynamodb == Some(false) {
        tracing::debug!(checks = ?checks, "API key table unreachable (non-critical)");
    }

    Json(ReadinessResponse { ready: true, checks })
}

/// Liveness probe endpoint
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { alive: true })
}
