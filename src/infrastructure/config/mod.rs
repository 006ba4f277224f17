use crate::domain::protocol::SessionSettings;
use crate::domain::synthesis::SynthesisParams;
use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    // Voices
    pub piper_path: PathBuf,
    pub data_dirs: Vec<PathBuf>,
    pub voices_json: Option<PathBuf>,
    pub default_voice: String,
    pub default_speaker: Option<String>,
    // Synthesis
    pub length_scale: Option<f32>,
    pub noise_scale: Option<f32>,
    pub noise_w: Option<f32>,
    pub auto_punctuation: String,
    pub samples_per_chunk: usize,
    pub streaming: bool,
    pub use_cuda: bool,
    pub max_piper_procs: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", "10200")?,
            log_format: env::var("LOG_FORMAT")
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })
                .unwrap_or(LogFormat::Pretty),
            piper_path: env::var("PIPER_PATH")
                .unwrap_or_else(|_| "piper".to_string())
                .into(),
            data_dirs: env::var("DATA_DIRS")
                .unwrap_or_else(|_| "./data".to_string())
                .split(',')
                .map(str::trim)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .collect(),
            voices_json: optional_var("VOICES_JSON").map(PathBuf::from),
            default_voice: env::var("DEFAULT_VOICE")
                .map_err(|_| AppError::Config("DEFAULT_VOICE must be set".to_string()))?,
            default_speaker: optional_var("DEFAULT_SPEAKER"),
            length_scale: parse_optional_var("LENGTH_SCALE")?,
            noise_scale: parse_optional_var("NOISE_SCALE")?,
            noise_w: parse_optional_var("NOISE_W")?,
            auto_punctuation: env::var("AUTO_PUNCTUATION").unwrap_or_else(|_| ".?!".to_string()),
            samples_per_chunk: parse_var("SAMPLES_PER_CHUNK", "1024")?,
            streaming: parse_flag("STREAMING"),
            use_cuda: parse_flag("USE_CUDA"),
            max_piper_procs: parse_var("MAX_PIPER_PROCS", "1")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.samples_per_chunk == 0 {
            return Err(AppError::Config(
                "SAMPLES_PER_CHUNK must be at least 1".to_string(),
            ));
        }
        if self.data_dirs.is_empty() {
            return Err(AppError::Config(
                "DATA_DIRS must name at least one directory".to_string(),
            ));
        }
        Ok(())
    }

    pub fn synthesis_params(&self) -> SynthesisParams {
        SynthesisParams {
            length_scale: self.length_scale,
            noise_scale: self.noise_scale,
            noise_w: self.noise_w,
            speaker_id: None,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            auto_punctuation: self.auto_punctuation.clone(),
            samples_per_chunk: self.samples_per_chunk,
            streaming: self.streaming,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{}={:?}: {}", name, raw, e)))
}

fn parse_optional_var<T: FromStr>(name: &str) -> AppResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{}={:?}: {}", name, raw, e)))
        })
        .transpose()
}

fn parse_flag(name: &str) -> bool {
    env::var(name)
        .map(|s| matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}
