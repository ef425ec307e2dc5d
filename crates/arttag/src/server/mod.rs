//! HTTP service exposing the tagger.
//!
//! - `POST /analyze`: multipart upload (field `image`), returns the category map
//! - `GET /health`: liveness, version and loaded categories
//!
//! The tagger is fully built before the listener binds and is shared
//! read-only across requests.

mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use arttag_core::config::ServerConfig;
use arttag_core::ArtTagger;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub tagger: ArtTagger,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(tagger: ArtTagger, config: ServerConfig) -> Self {
        Self { tagger, config }
    }
}

/// Build the router with both endpoints and the middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(
            state.config.max_body_size_mb.saturating_mul(BYTES_PER_MB),
        ))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.timeout_secs),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn start_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.clone();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    tracing::info!(
        "Starting arttag server on {} with categories [{}]",
        addr,
        state.tagger.store().category_names().join(", ")
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}MB, CORS: {}",
        config.timeout_secs,
        config.max_body_size_mb,
        config.enable_cors
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
