use anyhow::Result;
use axum::Router;
use piper_stream_server::controllers::{events::EventsController, health::HealthController};
use piper_stream_server::domain::protocol::{build_info, ClientEvent, ServerEvent};
use piper_stream_server::domain::voice::{VoiceCatalog, VoiceResolver};
use piper_stream_server::error::AppResult;
use piper_stream_server::infrastructure::backends::{ModelVoicePool, SynthesisBackend};
use piper_stream_server::infrastructure::config::{Config, LogFormat};
use piper_stream_server::infrastructure::http::build_router;
use piper_stream_server::infrastructure::voices::{AssetInstaller, LocalVoiceFiles};
use std::sync::Arc;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub mod assertions;
pub mod fakes;
pub mod ws_client;

use api_client::TestClient;
use fakes::{install_voice, ToneLoader, ToneRecorder};
use ws_client::WsClient;

pub const DEFAULT_VOICE: &str = "en_US-lessac-medium";
pub const MULTI_SPEAKER_VOICE: &str = "en_US-libritts-high";
pub const CUSTOM_VOICE: &str = "de_DE-custom-low";

pub const CATALOG_JSON: &str = r#"{
    "en_US-lessac-medium": {
        "key": "en_US-lessac-medium",
        "name": "lessac",
        "language": {"code": "en_US", "family": "en"},
        "quality": "medium",
        "speaker_id_map": {},
        "aliases": ["en-us-lessac-medium"]
    },
    "en_US-libritts-high": {
        "key": "en_US-libritts-high",
        "name": "libritts",
        "language": {"code": "en_US", "family": "en"},
        "quality": "high",
        "speaker_id_map": {"p3922": 0, "p8699": 1}
    },
    "fr_FR-siwis-low": {
        "key": "fr_FR-siwis-low",
        "language": {"code": "fr_FR"},
        "quality": "low"
    }
}"#;

/// A running server with in-process tone voices installed in a temp dir
pub struct TestContext {
    pub client: TestClient,
    pub ws_url: String,
    pub config: Config,
    pub recorder: Arc<ToneRecorder>,
    pub events: Arc<EventsController>,
    _voices: TempDir,
}

pub fn test_config(voices: &TempDir) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0, // Assigned by the OS
        log_format: LogFormat::Pretty,
        piper_path: "piper".into(),
        data_dirs: vec![voices.path().to_path_buf()],
        voices_json: None,
        default_voice: DEFAULT_VOICE.to_string(),
        default_speaker: None,
        length_scale: None,
        noise_scale: None,
        noise_w: None,
        auto_punctuation: ".?!".to_string(),
        samples_per_chunk: 256,
        streaming: true,
        use_cuda: false,
        max_piper_procs: 1,
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let voices = tempfile::tempdir().expect("Failed to create voices dir");
            install_voice(voices.path(), DEFAULT_VOICE, &[]);
            install_voice(voices.path(), MULTI_SPEAKER_VOICE, &[("p3922", 0), ("p8699", 1)]);
            install_voice(voices.path(), CUSTOM_VOICE, &[]);

            let config = test_config(&voices);
            let recorder = Arc::new(ToneRecorder::default());

            let (app, events) = create_app(&config, recorder.clone());

            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            // Wait for server to be ready
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            Self {
                client: TestClient::new(&format!("http://{}", addr)),
                ws_url: format!("ws://{}/ws", addr),
                config,
                recorder,
                events,
                _voices: voices,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Temp voices are removed on drop
        }
    }
}

pub fn create_app(config: &Config, recorder: Arc<ToneRecorder>) -> (Router, Arc<EventsController>) {
    let catalog = Arc::new(VoiceCatalog::from_json_str(CATALOG_JSON).expect("valid catalog"));
    let installer: Arc<dyn AssetInstaller> =
        Arc::new(LocalVoiceFiles::new(config.data_dirs.clone()));
    let info = Arc::new(build_info(
        &catalog,
        &installer.installed_voices(),
        config.streaming,
    ));

    let backend: Arc<dyn SynthesisBackend> = Arc::new(ModelVoicePool::new(
        VoiceResolver::new(
            catalog,
            config.default_voice.clone(),
            config.default_speaker.clone(),
        ),
        installer.clone(),
        Arc::new(ToneLoader { recorder }),
        config.synthesis_params(),
        config.use_cuda,
    ));

    let health = Arc::new(HealthController::new(
        config.default_voice.clone(),
        config.streaming,
        installer,
    ));
    let events = Arc::new(EventsController::new(
        backend,
        Arc::new(config.session_settings()),
        info,
    ));

    (build_router(health, events.clone()), events)
}

impl TestContext {
    pub async fn ws(&self) -> Result<WsClient> {
        WsClient::connect(&self.ws_url).await
    }

    /// Run raw JSON events through one in-memory connection and collect the output
    pub async fn run_raw(&self, raw_events: &[serde_json::Value]) -> (AppResult<()>, Vec<ServerEvent>) {
        let (tx, mut rx) = mpsc::channel(4096);
        let session = self.events.session(tx);
        let incoming = futures::stream::iter(
            raw_events
                .iter()
                .map(|event| ClientEvent::from_json(&event.to_string()))
                .collect::<Vec<_>>(),
        );

        let result =
            piper_stream_server::controllers::events::run_connection(session, incoming).await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (result, events)
    }
}
