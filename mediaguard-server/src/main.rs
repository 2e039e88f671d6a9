//! MediaGuard Server - REST API for media manipulation analysis
//!
//! Exposes mediaguard-core functionality via HTTP endpoints:
//! - POST /media/analyze/image - Analyze an image synchronously
//! - POST /media/analyze/video - Queue a video for analysis
//! - GET /media/status/{job_id} - Poll a video job

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use mediaguard_core::JobOrchestrator;
use mediaguard_server::{create_router_with_state, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mediaguard_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        addr = %config.socket_addr(),
        workers = config.worker_count,
        queue_capacity = config.queue_capacity,
        max_frames = config.max_frames,
        "Loaded server configuration"
    );

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize analysis pipeline");
            return ExitCode::FAILURE;
        }
    };
    let orchestrator = state.orchestrator.clone();
    let app = create_router_with_state(&config, state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "MediaGuard API listening (docs at /docs)");

    // Peer addresses feed the per-client rate limiter
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(orchestrator.clone()))
    .await;

    tracing::info!("Server stopped accepting connections, draining video jobs");
    orchestrator.shutdown().await;

    match served {
        Ok(()) => {
            tracing::info!("Graceful shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

/// Wait for Ctrl-C or SIGTERM, then close the job queue so `/ready` turns
/// unavailable while open connections drain.
async fn shutdown_signal(orchestrator: Arc<JobOrchestrator>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
    orchestrator.close();
}
