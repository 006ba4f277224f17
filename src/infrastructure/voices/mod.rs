pub mod installer;
pub mod voice_config;

pub use installer::{AssetInstaller, LocalVoiceFiles, VoiceFiles};
pub use voice_config::VoiceConfigFile;

use crate::domain::voice::VoiceCatalog;
use crate::error::{AppError, AppResult};
use std::path::Path;

/// Load a piper-style `voices.json`
pub async fn load_catalog(path: &Path) -> AppResult<VoiceCatalog> {
    let json = tokio::fs::read_to_string(path).await?;
    VoiceCatalog::from_json_str(&json)
        .map_err(|e| AppError::Config(format!("Invalid voice catalog {}: {}", path.display(), e)))
}
