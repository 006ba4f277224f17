use super::info::Info;
use crate::domain::voice::{AudioFormat, VoiceSelector};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesize {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceSelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeStart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceSelector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeChunk {
    pub text: String,
}

/// Events a client sends
///
/// On the wire every event is `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    Describe,
    Synthesize(Synthesize),
    SynthesizeStart(SynthesizeStart),
    SynthesizeChunk(SynthesizeChunk),
    SynthesizeStop,
    /// Any event type this server does not handle
    #[serde(skip)]
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<Value>,
}

impl ClientEvent {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let raw: RawEvent = serde_json::from_str(json)
            .map_err(|e| AppError::Protocol(format!("malformed event: {}", e)))?;
        let data = raw.data.unwrap_or_else(|| Value::Object(Default::default()));

        let event = match raw.event_type.as_str() {
            "describe" => ClientEvent::Describe,
            "synthesize" => ClientEvent::Synthesize(decode_data(&raw.event_type, data)?),
            "synthesize-start" => {
                ClientEvent::SynthesizeStart(decode_data(&raw.event_type, data)?)
            }
            "synthesize-chunk" => {
                ClientEvent::SynthesizeChunk(decode_data(&raw.event_type, data)?)
            }
            "synthesize-stop" => ClientEvent::SynthesizeStop,
            _ => ClientEvent::Unknown(raw.event_type),
        };

        Ok(event)
    }

    pub fn event_type(&self) -> &str {
        match self {
            ClientEvent::Describe => "describe",
            ClientEvent::Synthesize(_) => "synthesize",
            ClientEvent::SynthesizeStart(_) => "synthesize-start",
            ClientEvent::SynthesizeChunk(_) => "synthesize-chunk",
            ClientEvent::SynthesizeStop => "synthesize-stop",
            ClientEvent::Unknown(event_type) => event_type,
        }
    }
}

fn decode_data<T: serde::de::DeserializeOwned>(event_type: &str, data: Value) -> AppResult<T> {
    serde_json::from_value(data)
        .map_err(|e| AppError::Protocol(format!("invalid {} event: {}", event_type, e)))
}

/// Events the server sends back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Info(Info),
    AudioStart {
        rate: u32,
        width: u16,
        channels: u16,
    },
    AudioChunk {
        rate: u32,
        width: u16,
        channels: u16,
        #[serde(with = "base64_audio")]
        audio: Vec<u8>,
    },
    AudioStop,
    SynthesizeStopped,
    Error {
        text: String,
        code: String,
    },
}

impl ServerEvent {
    pub fn audio_start(format: AudioFormat) -> Self {
        ServerEvent::AudioStart {
            rate: format.rate,
            width: format.width,
            channels: format.channels,
        }
    }

    pub fn audio_chunk(format: AudioFormat, audio: Vec<u8>) -> Self {
        ServerEvent::AudioChunk {
            rate: format.rate,
            width: format.width,
            channels: format.channels,
            audio,
        }
    }

    pub fn error(err: &AppError) -> Self {
        ServerEvent::Error {
            text: err.to_string(),
            code: err.code().to_string(),
        }
    }

    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Protocol(format!("failed to encode event: {}", e)))
    }
}

mod base64_audio {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(audio: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(audio))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
