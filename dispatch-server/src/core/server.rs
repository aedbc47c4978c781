//! HTTP server
//!
//! Builds the router, serves it over plain HTTP and drains background
//! tasks on shutdown.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};
use crate::utils::{AppError, AppResult};

/// Access log line per request, tagged with `x-request-id` (generated when absent)
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::warn!(target: "http_access", request_id = %request_id, latency_ms, "{} {} {}", method, uri, status);
    } else {
        tracing::info!(target: "http_access", request_id = %request_id, latency_ms, "{} {} {}", method, uri, status);
    }

    response
}

/// Build the full application with state and tower layers applied
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    crate::api::router()
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(log_request))
}

/// Serves a prepared [`ServerState`] until Ctrl-C
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    pub async fn run(self) -> AppResult<()> {
        let tasks = self.state.start_background_tasks();
        tasks.log_summary();

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!(%addr, "dispatch server listening");

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown signal received");
        };

        let served = axum::serve(listener, build_app(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")));

        if tasks.check_health() > 0 {
            tracing::warn!("some background tasks had stopped before shutdown");
        }
        tasks.shutdown().await;
        served
    }
}
