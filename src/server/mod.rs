//! HTTP server for inference
//!
//! Serves service metadata, a health probe and the `/predict` upload endpoint.

mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::model::ModelHandle;

pub use handlers::{ApiError, AppState, FILE_FIELD};
pub use routes::api_routes;

/// Build the application router with CORS, body limit and request tracing.
///
/// # Errors
///
/// Returns an error if a configured CORS origin is not a valid header value.
pub fn app(state: Arc<AppState>, config: &ServerConfig) -> Result<Router> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let body_limit = config
        .max_body_size
        .map_or_else(DefaultBodyLimit::disable, DefaultBodyLimit::max);

    Ok(Router::new()
        .merge(api_routes())
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the HTTP inference server
///
/// # Errors
///
/// Returns an error if the router cannot be built or the address cannot be bound.
pub async fn start(model: Arc<ModelHandle>, config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState::new(model));
    let app = app(state, &config)?;

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /        - Service info");
    tracing::info!("  GET  /health  - Health check");
    tracing::info!("  POST /predict - Upload image for analysis");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        return;
    }
    tracing::info!("Shutting down");
}
