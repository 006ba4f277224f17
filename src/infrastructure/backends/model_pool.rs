use super::synthesis_backend::{speaker_override, SynthesisBackend};
use crate::domain::synthesis::SynthesisParams;
use crate::domain::voice::{SynthesizedAudio, VoiceResolver, VoiceSelector};
use crate::error::{AppError, AppResult};
use crate::infrastructure::audio::read_wav_bytes;
use crate::infrastructure::voices::{AssetInstaller, VoiceFiles};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A voice model loaded into this process
pub trait VoiceModel: Send + Sync {
    fn speaker_id_map(&self) -> &HashMap<String, i64>;

    /// Render `text` as a complete WAV file. Runs on a blocking thread.
    fn synthesize_wav(&self, text: &str, params: &SynthesisParams) -> AppResult<Vec<u8>>;
}

/// Loads [`VoiceModel`]s from installed voice files
#[async_trait]
pub trait VoiceModelLoader: Send + Sync {
    async fn load(&self, voice: &VoiceFiles, use_cuda: bool) -> AppResult<Arc<dyn VoiceModel>>;
}

struct LoadedVoice {
    key: String,
    model: Arc<dyn VoiceModel>,
}

/// In-process backend keeping a single voice model resident.
///
/// Asking for another voice unloads the current model and loads the new one
/// while holding the same lock that guards synthesis.
pub struct ModelVoicePool {
    resolver: VoiceResolver,
    installer: Arc<dyn AssetInstaller>,
    loader: Arc<dyn VoiceModelLoader>,
    params: SynthesisParams,
    use_cuda: bool,
    loaded: Mutex<Option<LoadedVoice>>,
}

impl ModelVoicePool {
    pub fn new(
        resolver: VoiceResolver,
        installer: Arc<dyn AssetInstaller>,
        loader: Arc<dyn VoiceModelLoader>,
        params: SynthesisParams,
        use_cuda: bool,
    ) -> Self {
        Self {
            resolver,
            installer,
            loader,
            params,
            use_cuda,
            loaded: Mutex::new(None),
        }
    }

    /// Key of the resident voice, if any
    pub async fn loaded_voice(&self) -> Option<String> {
        self.loaded.lock().await.as_ref().map(|voice| voice.key.clone())
    }

    /// Return the model for `key`, swapping out whatever is resident.
    /// Caller holds the pool lock.
    async fn get_voice(
        &self,
        loaded: &mut Option<LoadedVoice>,
        key: &str,
    ) -> AppResult<Arc<dyn VoiceModel>> {
        if let Some(voice) = loaded.as_ref().filter(|voice| voice.key == key) {
            return Ok(voice.model.clone());
        }

        if let Some(previous) = loaded.take() {
            tracing::info!(voice = %previous.key, "Unloading voice");
        }

        let files = self.installer.ensure_voice(key).await?;
        tracing::info!(
            voice = key,
            model = %files.model_path.display(),
            use_cuda = self.use_cuda,
            "Loading voice"
        );
        let model = self.loader.load(&files, self.use_cuda).await?;

        *loaded = Some(LoadedVoice {
            key: key.to_string(),
            model: model.clone(),
        });

        Ok(model)
    }
}

#[async_trait]
impl SynthesisBackend for ModelVoicePool {
    async fn synthesize(&self, text: &str, voice: &VoiceSelector) -> AppResult<SynthesizedAudio> {
        let resolved = self.resolver.resolve(voice);

        let wav = {
            let mut loaded = self.loaded.lock().await;
            let model = self.get_voice(&mut loaded, &resolved.key).await?;

            let params = SynthesisParams {
                speaker_id: speaker_override(model.speaker_id_map(), &resolved),
                ..self.params
            };
            tracing::debug!(voice = %resolved.key, ?params, text, "Synthesizing");

            let text = text.to_string();
            tokio::task::spawn_blocking(move || model.synthesize_wav(&text, &params))
                .await
                .map_err(|e| AppError::Backend(format!("Synthesis task failed: {}", e)))??
        };

        read_wav_bytes(&wav)
    }
}
