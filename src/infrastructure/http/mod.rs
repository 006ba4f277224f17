use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod request_id;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

use crate::controllers::{events::EventsController, health::HealthController};
use crate::infrastructure::config::Config;

/// Routes for health checks and the WebSocket event endpoint
pub fn build_router(health: Arc<HealthController>, events: Arc<EventsController>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(HealthController::health))
        .route("/health/ready", get(HealthController::health_ready))
        .with_state(health);

    let event_routes = Router::new()
        .route("/ws", get(EventsController::connect))
        .with_state(events);

    Router::new()
        .merge(health_routes)
        .merge(event_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: &Config,
    health: Arc<HealthController>,
    events: Arc<EventsController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(health, events);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
