use crate::domain::voice::{VoiceCatalog, VoiceEntry};
use serde::{Deserialize, Serialize};

const PIPER_URL: &str = "https://github.com/rhasspy/piper";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    pub url: String,
}

impl Attribution {
    fn piper() -> Self {
        Self {
            name: "rhasspy".to_string(),
            url: PIPER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsVoiceSpeaker {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsVoice {
    pub name: String,
    pub description: String,
    pub attribution: Attribution,
    pub installed: bool,
    #[serde(default)]
    pub version: Option<String>,
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<TtsVoiceSpeaker>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsProgram {
    pub name: String,
    pub description: String,
    pub attribution: Attribution,
    pub installed: bool,
    pub version: String,
    pub voices: Vec<TtsVoice>,
    pub supports_synthesize_streaming: bool,
}

/// Answer to a `describe` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub tts: Vec<TtsProgram>,
}

impl Info {
    pub fn voices(&self) -> impl Iterator<Item = &TtsVoice> {
        self.tts.iter().flat_map(|program| program.voices.iter())
    }
}

/// Describe the catalog voices plus any installed custom voices the catalog
/// does not know about
pub fn build_info(catalog: &VoiceCatalog, installed: &[String], streaming: bool) -> Info {
    let mut voices: Vec<TtsVoice> = catalog
        .entries()
        .map(|entry| catalog_voice(entry, installed.contains(&entry.key)))
        .collect();

    voices.extend(
        installed
            .iter()
            .filter(|key| catalog.resolve(key).is_none())
            .map(|key| custom_voice(key)),
    );

    voices.sort_by(|a, b| a.name.cmp(&b.name));

    Info {
        tts: vec![TtsProgram {
            name: "piper".to_string(),
            description: "A fast, local, neural text to speech engine".to_string(),
            attribution: Attribution::piper(),
            installed: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            voices,
            supports_synthesize_streaming: streaming,
        }],
    }
}

fn catalog_voice(entry: &VoiceEntry, installed: bool) -> TtsVoice {
    let speakers = if entry.speaker_id_map.is_empty() {
        None
    } else {
        let mut speakers: Vec<(&String, &i64)> = entry.speaker_id_map.iter().collect();
        speakers.sort_by_key(|(_, id)| **id);
        Some(
            speakers
                .into_iter()
                .map(|(name, _)| TtsVoiceSpeaker { name: name.clone() })
                .collect(),
        )
    };

    let description = match (&entry.name, &entry.quality) {
        (Some(name), Some(quality)) => format!("{} ({})", name, quality),
        (Some(name), None) => name.clone(),
        _ => entry.key.clone(),
    };

    TtsVoice {
        name: entry.key.clone(),
        description,
        attribution: Attribution::piper(),
        installed,
        version: None,
        languages: vec![entry.language.code.clone()],
        speakers,
    }
}

fn custom_voice(key: &str) -> TtsVoice {
    // Custom voices follow the `<lang>_<REGION>-<name>-<quality>` naming when they can
    let language = key
        .split_once('-')
        .map(|(language, _)| language)
        .unwrap_or(key);

    TtsVoice {
        name: key.to_string(),
        description: key.to_string(),
        attribution: Attribution {
            name: String::new(),
            url: String::new(),
        },
        installed: true,
        version: None,
        languages: vec![language.to_string()],
        speakers: None,
    }
}
