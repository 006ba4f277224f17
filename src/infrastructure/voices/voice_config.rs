use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// The parts of a voice's `.onnx.json` the server cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceConfigFile {
    #[serde(default)]
    pub speaker_id_map: HashMap<String, i64>,
}

impl VoiceConfigFile {
    pub async fn load(path: &Path) -> AppResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&json).map_err(|e| {
            AppError::Backend(format!("Invalid voice config {}: {}", path.display(), e))
        })
    }
}
