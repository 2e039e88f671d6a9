//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method, StatusCode},
    routing::{get, post},
    Router,
};
use mediaguard_core::{FfmpegBackend, MockClassifier};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{
    analyze_image_handler, analyze_video_handler, health, job_status_handler, ready, root,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router with default config (for testing)
///
/// Uses the mock classifier and ffmpeg from `PATH`.
pub fn create_router() -> Router {
    let config = Config::default();
    let state = AppState::with_components(
        &config,
        Arc::new(MockClassifier::default()),
        Arc::new(FfmpegBackend::new(config.ffmpeg.clone())),
    );
    create_router_with_state(&config, state)
}

/// Create the application router with custom configuration and state
pub fn create_router_with_state(config: &Config, state: AppState) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Request body limit; the multipart extractor has its own default cap
    let body_limit_bytes = config.body_limit_mb * 1024 * 1024;

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    let mut image_routes =
        Router::new().route("/media/analyze/image", post(analyze_image_handler));
    let mut video_routes =
        Router::new().route("/media/analyze/video", post(analyze_video_handler));

    // Conditionally apply rate limiting (disabled in tests, enabled in production).
    // Per-client token bucket allowing `per_minute` requests with an equal burst.
    let rate_limit = |route: &str, per_minute: u32| {
        let per_minute = per_minute.max(1);
        let governor_conf = GovernorConfigBuilder::default()
            .period(Duration::from_millis(60_000 / per_minute as u64))
            .burst_size(per_minute)
            .finish()
            .expect("Failed to build rate limiter config");

        tracing::info!(route, per_minute, "Rate limiting enabled");
        GovernorLayer::new(Arc::new(governor_conf))
    };

    if config.rate_limit_enabled {
        image_routes = image_routes.route_layer(rate_limit(
            "/media/analyze/image",
            config.image_rate_limit_per_min,
        ));
        video_routes = video_routes.route_layer(rate_limit(
            "/media/analyze/video",
            config.video_rate_limit_per_min,
        ));
    } else {
        tracing::warn!("Rate limiting: DISABLED");
    }

    let request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/media/status/{job_id}", get(job_status_handler))
        .merge(image_routes)
        .merge(video_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(timeout)
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}
