//! HTTP front end for the consultation pipeline

mod error;
mod handlers;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{ServerSettings, Settings};
use crate::pipeline::Pipeline;

/// Headroom above the audio ceiling for multipart framing and form fields
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the router with all API routes and middleware.
pub fn create_app(state: AppState, server: &ServerSettings) -> Router {
    let body_limit =
        state.pipeline.limits().max_upload_bytes as usize + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/process-audio", post(handlers::process_audio))
        .route("/api/transcribe-only", post(handlers::transcribe_only))
        .route("/api/process-transcript", post(handlers::process_transcript))
        .route("/api/session/:session_id", get(handlers::get_session))
        .route("/api/export-json/:session_id", get(handlers::export_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_dirs()?;
    let pipeline = Pipeline::from_settings(settings)?;
    if !pipeline.documents_enabled() {
        warn!("Google Docs generation disabled; documents will be reported as failed");
    }

    let app = create_app(AppState::new(pipeline), &settings.server);
    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("{} listening on http://{}", crate::SERVICE_NAME, address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down..."),
        _ = wait_for_sigterm() => info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
