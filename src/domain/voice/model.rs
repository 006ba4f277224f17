use serde::{Deserialize, Serialize};

/// Voice requested by a client. Missing fields fall back to the configured
/// defaults when the backend resolves the voice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl VoiceSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }
}

/// Frame layout shared by every event of one audio sub-stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Samples per second
    pub rate: u32,
    /// Bytes per sample
    pub width: u16,
    pub channels: u16,
}

impl AudioFormat {
    /// What piper voices produce: 22.05 kHz, 16-bit mono
    pub const PIPER_DEFAULT: AudioFormat = AudioFormat {
        rate: 22050,
        width: 2,
        channels: 1,
    };

    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.width) * usize::from(self.channels)
    }
}

/// Raw PCM produced by one synthesis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub format: AudioFormat,
    pub pcm: Vec<u8>,
}
