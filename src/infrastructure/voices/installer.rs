use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Model and config files of one installed voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceFiles {
    pub key: String,
    pub model_path: PathBuf,
    pub config_path: PathBuf,
}

/// Guarantees a voice's files are present locally before a backend loads it
#[async_trait]
pub trait AssetInstaller: Send + Sync {
    async fn ensure_voice(&self, key: &str) -> AppResult<VoiceFiles>;

    /// Keys of every voice already present
    fn installed_voices(&self) -> Vec<String>;
}

/// Looks voices up as `<key>.onnx` + `<key>.onnx.json` in a list of data
/// directories. Nothing is downloaded; a missing voice is an error.
#[derive(Debug, Clone)]
pub struct LocalVoiceFiles {
    data_dirs: Vec<PathBuf>,
}

impl LocalVoiceFiles {
    pub fn new(data_dirs: Vec<PathBuf>) -> Self {
        Self { data_dirs }
    }

    fn find_in(dir: &Path, key: &str) -> Option<VoiceFiles> {
        let model_path = dir.join(format!("{}.onnx", key));
        let config_path = dir.join(format!("{}.onnx.json", key));

        (model_path.is_file() && config_path.is_file()).then(|| VoiceFiles {
            key: key.to_string(),
            model_path,
            config_path,
        })
    }
}

#[async_trait]
impl AssetInstaller for LocalVoiceFiles {
    async fn ensure_voice(&self, key: &str) -> AppResult<VoiceFiles> {
        if key.is_empty() || key.contains(&['/', '\\'][..]) {
            return Err(AppError::VoiceNotFound(key.to_string()));
        }

        self.data_dirs
            .iter()
            .find_map(|dir| Self::find_in(dir, key))
            .ok_or_else(|| {
                tracing::warn!(voice = key, data_dirs = ?self.data_dirs, "Voice files not found");
                AppError::VoiceNotFound(key.to_string())
            })
    }

    fn installed_voices(&self) -> Vec<String> {
        let mut keys = BTreeSet::new();

        for dir in &self.data_dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let file_name = entry.file_name();
                let Some(key) = file_name.to_str().and_then(|name| name.strip_suffix(".onnx"))
                else {
                    continue;
                };
                if Self::find_in(dir, key).is_some() {
                    keys.insert(key.to_string());
                }
            }
        }

        keys.into_iter().collect()
    }
}
