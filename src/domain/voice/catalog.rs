use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Language block of a catalog entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceLanguage {
    pub code: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub name_english: Option<String>,
}

/// One voice of a piper-style `voices.json`
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceEntry {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: VoiceLanguage,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub speaker_id_map: HashMap<String, i64>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Read-only mapping from requested voice names (keys or aliases) to voices
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: BTreeMap<String, VoiceEntry>,
    aliases: HashMap<String, String>,
}

impl VoiceCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let voices: BTreeMap<String, VoiceEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(voices.into_values()))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = VoiceEntry>) -> Self {
        let mut voices = BTreeMap::new();
        let mut aliases = HashMap::new();

        for entry in entries {
            for alias in &entry.aliases {
                aliases.insert(alias.clone(), entry.key.clone());
            }
            voices.insert(entry.key.clone(), entry);
        }

        Self { voices, aliases }
    }

    pub fn resolve(&self, name: &str) -> Option<&VoiceEntry> {
        self.voices.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|key| self.voices.get(key))
        })
    }

    /// Canonical key for a requested name. Names missing from the catalog are
    /// returned unchanged so locally installed custom voices still work.
    pub fn canonical_key(&self, name: &str) -> String {
        self.resolve(name)
            .map(|entry| entry.key.clone())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn entries(&self) -> impl Iterator<Item = &VoiceEntry> {
        self.voices.values()
    }
}
