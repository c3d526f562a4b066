//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Hub status with connection count

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status
    pub status: String,
    /// Number of registered connections
    pub connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// When the server started
    pub started_at: DateTime<Utc>,
    /// Application version
    pub version: String,
}

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Asks the hub for its connection set; 503 if the hub has stopped.
pub async fn full_health(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let stats = state.hub.snapshot().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        connections: stats.connection_count(),
        uptime_seconds: state.uptime_seconds(),
        started_at: state.started_at,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
