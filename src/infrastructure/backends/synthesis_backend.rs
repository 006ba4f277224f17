use crate::domain::voice::{resolve_speaker_id, ResolvedVoice, SynthesizedAudio, VoiceSelector};
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// Text-to-audio capability shared by every engine the server can drive.
///
/// Implementations own their voices and serialize access to them: voice
/// load/switch and the synthesis call run as one critical section, and
/// callers wait for it rather than failing.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Synthesize already normalized `text` with the requested voice
    ///
    /// # Errors
    /// Unknown voices, engine crashes and unreadable engine output are fatal.
    /// An unknown speaker is not: synthesis falls back to the voice's default.
    async fn synthesize(&self, text: &str, voice: &VoiceSelector) -> AppResult<SynthesizedAudio>;
}

/// Speaker id override for a resolved voice, logging speakers that do not exist
pub(crate) fn speaker_override(
    speaker_id_map: &HashMap<String, i64>,
    voice: &ResolvedVoice,
) -> Option<i64> {
    let speaker = voice.speaker.as_deref()?;
    let speaker_id = resolve_speaker_id(speaker_id_map, speaker);
    if speaker_id.is_none() {
        tracing::warn!(speaker, voice = %voice.key, "No such speaker for voice");
    }
    speaker_id
}
