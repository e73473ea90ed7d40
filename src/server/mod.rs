//! HTTP and WebSocket surface

pub mod error;
pub mod routes;
pub mod ws;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::command::CommandOrchestrator;
use crate::core::config::ServerConfig;
use crate::core::error::Result;

pub use error::ApiError;

pub struct AppState {
    pub orchestrator: Arc<CommandOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<CommandOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}

pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/test", get(routes::deployment_check))
        .route("/api/v1/voice/command", post(routes::voice_command))
        .route("/api/v1/voice/menus", get(routes::menus))
        .route("/api/v1/voice/refresh", post(routes::refresh))
        .route("/api/v1/ws/status/:user_id", get(ws::status))
        .route("/api/v1/ws/:user_id", get(ws::ws_handler))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process exits
pub async fn serve(state: Arc<AppState>, config: &ServerConfig) -> Result<()> {
    let app = router(state, &config.cors_origins);
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}
