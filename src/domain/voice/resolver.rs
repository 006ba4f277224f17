use super::catalog::VoiceCatalog;
use super::model::VoiceSelector;
use std::sync::Arc;

/// Voice key and speaker a request ends up using
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVoice {
    pub key: String,
    pub speaker: Option<String>,
}

/// Applies the configured defaults and catalog aliases to a [`VoiceSelector`]
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    catalog: Arc<VoiceCatalog>,
    default_voice: String,
    default_speaker: Option<String>,
}

impl VoiceResolver {
    pub fn new(
        catalog: Arc<VoiceCatalog>,
        default_voice: String,
        default_speaker: Option<String>,
    ) -> Self {
        Self {
            catalog,
            default_voice,
            default_speaker,
        }
    }

    pub fn resolve(&self, selector: &VoiceSelector) -> ResolvedVoice {
        let name = selector
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.default_voice);
        let key = self.catalog.canonical_key(name);

        // The default speaker only belongs to the default voice
        let speaker = selector
            .speaker
            .clone()
            .filter(|speaker| !speaker.is_empty())
            .or_else(|| {
                if key == self.catalog.canonical_key(&self.default_voice) {
                    self.default_speaker.clone()
                } else {
                    None
                }
            });

        ResolvedVoice { key, speaker }
    }
}
