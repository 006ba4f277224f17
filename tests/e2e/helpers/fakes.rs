use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;
use piper_stream_server::domain::synthesis::SynthesisParams;
use piper_stream_server::error::{AppError, AppResult};
use piper_stream_server::infrastructure::backends::{VoiceModel, VoiceModelLoader};
use piper_stream_server::infrastructure::voices::VoiceFiles;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 22050;

/// 16-bit mono WAV with `samples` samples
pub fn wav_bytes(samples: usize) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec).expect("wav writer");
    for i in 0..samples {
        writer.write_sample((i % 128) as i16).expect("wav sample");
    }
    writer.finalize().expect("wav finalize");
    cursor.into_inner()
}

/// Lay out `<key>.onnx` and `<key>.onnx.json` the way piper voices are installed
pub fn install_voice(dir: &Path, key: &str, speakers: &[(&str, i64)]) {
    let speaker_id_map: HashMap<&str, i64> = speakers.iter().copied().collect();
    std::fs::write(dir.join(format!("{}.onnx", key)), b"model").expect("write model");
    std::fs::write(
        dir.join(format!("{}.onnx.json", key)),
        serde_json::json!({ "speaker_id_map": speaker_id_map }).to_string(),
    )
    .expect("write voice config");
}

/// Tracks how many synthesis calls run at the same time
#[derive(Default)]
pub struct Gauge {
    active: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(active, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// One synthesis request as the model saw it
#[derive(Debug, Clone, PartialEq)]
pub struct ToneCall {
    pub voice: String,
    pub text: String,
    pub speaker_id: Option<i64>,
}

/// Writes `SAMPLES_PER_CHAR` samples per character of text
pub struct ToneModel {
    key: String,
    speakers: HashMap<String, i64>,
    recorder: Arc<ToneRecorder>,
}

pub const SAMPLES_PER_CHAR: usize = 100;

#[derive(Default)]
pub struct ToneRecorder {
    pub calls: Mutex<Vec<ToneCall>>,
    pub loads: Mutex<Vec<String>>,
    pub gauge: Gauge,
    pub delay: Mutex<Duration>,
    /// Text that makes the model fail
    pub poison: Mutex<Option<String>>,
}

impl ToneRecorder {
    pub fn texts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|call| call.text.clone()).collect()
    }
}

impl VoiceModel for ToneModel {
    fn speaker_id_map(&self) -> &HashMap<String, i64> {
        &self.speakers
    }

    fn synthesize_wav(&self, text: &str, params: &SynthesisParams) -> AppResult<Vec<u8>> {
        self.recorder.gauge.enter();
        let delay = *self.recorder.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.recorder.calls.lock().push(ToneCall {
            voice: self.key.clone(),
            text: text.to_string(),
            speaker_id: params.speaker_id,
        });
        let poisoned = self.recorder.poison.lock().as_deref() == Some(text);
        self.recorder.gauge.exit();

        if poisoned {
            return Err(AppError::Backend("model crashed".to_string()));
        }
        Ok(wav_bytes(text.chars().count() * SAMPLES_PER_CHAR))
    }
}

pub struct ToneLoader {
    pub recorder: Arc<ToneRecorder>,
}

#[async_trait]
impl VoiceModelLoader for ToneLoader {
    async fn load(&self, voice: &VoiceFiles, _use_cuda: bool) -> AppResult<Arc<dyn VoiceModel>> {
        let config = tokio::fs::read_to_string(&voice.config_path).await?;
        let config: serde_json::Value = serde_json::from_str(&config)
            .map_err(|e| AppError::Backend(format!("bad voice config: {}", e)))?;
        let speakers: HashMap<String, i64> = config
            .get("speaker_id_map")
            .cloned()
            .and_then(|map| serde_json::from_value(map).ok())
            .unwrap_or_default();

        self.recorder.loads.lock().push(voice.key.clone());
        Ok(Arc::new(ToneModel {
            key: voice.key.clone(),
            speakers,
            recorder: self.recorder.clone(),
        }))
    }
}
