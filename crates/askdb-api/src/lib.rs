//! askdb API: HTTP front end over the question-answering pipeline.
//!
//! | Method | Path       | Purpose                                     |
//! |--------|------------|---------------------------------------------|
//! | POST   | `/query`   | question → SQL → result → answer            |
//! | GET    | `/health`  | liveness                                    |
//! | GET    | `/metrics` | Prometheus text exposition                  |
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod telemetry;

use askdb_core::PipelineRunner;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use bootstrap::{build_runner, build_state};
pub use error::ApiError;
pub use metrics::Metrics;

/// Handles shared by every request. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<PipelineRunner>,
    pub metrics: Arc<Metrics>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/query", post(handlers::query))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("askdb API listening on {}", addr);
    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutting down");
}
