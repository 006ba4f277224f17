use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::voices::AssetInstaller;

pub struct HealthController {
    default_voice: String,
    streaming: bool,
    installer: Arc<dyn AssetInstaller>,
}

impl HealthController {
    pub fn new(default_voice: String, streaming: bool, installer: Arc<dyn AssetInstaller>) -> Self {
        Self {
            default_voice,
            streaming,
            installer,
        }
    }

    /// GET /health - liveness
    pub async fn health() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// GET /health/ready - ready once the default voice is installed
    pub async fn health_ready(State(controller): State<Arc<HealthController>>) -> impl IntoResponse {
        match controller.installer.ensure_voice(&controller.default_voice).await {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({
                    "status": "ready",
                    "default_voice": controller.default_voice,
                    "voice": "installed",
                    "streaming": controller.streaming
                })),
            ),
            Err(e) => {
                tracing::warn!(error = %e, voice = %controller.default_voice, "Default voice unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "status": "not_ready",
                        "default_voice": controller.default_voice,
                        "voice": "missing",
                        "streaming": controller.streaming
                    })),
                )
            }
        }
    }
}
