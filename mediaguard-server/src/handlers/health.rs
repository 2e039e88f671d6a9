//! Health check handlers
//!
//! Provides the service banner plus health and readiness endpoints for
//! monitoring and orchestration.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Service banner
#[derive(Serialize, ToSchema)]
pub struct RootResponse {
    #[schema(example = "MediaGuard API running")]
    pub status: &'static str,
    pub privacy: &'static str,
    pub features: Vec<&'static str>,
}

/// GET / - Service banner
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Service banner", body = RootResponse))
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "MediaGuard API running",
        privacy: "No media is stored",
        features: vec![
            "Image manipulation analysis",
            "Asynchronous video analysis",
            "Explainable heatmaps",
            "Hash-only audit trail",
        ],
    })
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Service name
    pub service: &'static str,
    /// Where frame scores come from
    pub classifier: String,
    /// Video jobs not yet finished
    pub jobs_in_flight: usize,
    /// Maximum queued video jobs
    pub queue_capacity: usize,
}

/// GET /health - Health check endpoint
///
/// Returns JSON with service status, version, classifier and queue usage.
/// Used for monitoring and load balancer health checks.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "mediaguard-server",
        classifier: state.scorer.source_id().to_string(),
        jobs_in_flight: state.orchestrator.store().in_flight(),
        queue_capacity: state.orchestrator.queue_capacity(),
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /ready - Kubernetes readiness probe
///
/// Returns 200 while the job queue accepts work, 503 once shutdown began.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready", body = ReadyResponse),
        (status = 503, description = "Shutting down", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if state.orchestrator.is_accepting() {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some("Job queue closed"),
            }),
        )
    }
}
