use piper_stream_server::controllers::{events::EventsController, health::HealthController};
use piper_stream_server::domain::protocol::build_info;
use piper_stream_server::domain::voice::{VoiceCatalog, VoiceResolver};
use piper_stream_server::infrastructure::backends::{
    PiperProcessPool, PiperSettings, SynthesisBackend,
};
use piper_stream_server::infrastructure::config::{Config, LogFormat};
use piper_stream_server::infrastructure::http::start_http_server;
use piper_stream_server::infrastructure::voices::{load_catalog, AssetInstaller, LocalVoiceFiles};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    init_logging(&config);

    tracing::info!(
        "Starting piper stream server on {}:{}",
        config.host,
        config.port
    );

    let catalog = match &config.voices_json {
        Some(path) => {
            let catalog = load_catalog(path).await?;
            tracing::info!(path = %path.display(), voices = catalog.entries().count(), "Voice catalog loaded");
            catalog
        }
        None => {
            tracing::info!("No voice catalog configured, using installed voices only");
            VoiceCatalog::default()
        }
    };
    let catalog = Arc::new(catalog);

    let installer: Arc<dyn AssetInstaller> = Arc::new(LocalVoiceFiles::new(config.data_dirs.clone()));
    let installed = installer.installed_voices();
    tracing::info!(data_dirs = ?config.data_dirs, installed = ?installed, "Voices found");

    let info = Arc::new(build_info(&catalog, &installed, config.streaming));

    let resolver = VoiceResolver::new(
        catalog,
        config.default_voice.clone(),
        config.default_speaker.clone(),
    );
    let backend: Arc<dyn SynthesisBackend> = Arc::new(PiperProcessPool::new(
        resolver,
        installer.clone(),
        PiperSettings {
            piper_path: config.piper_path.clone(),
            params: config.synthesis_params(),
            use_cuda: config.use_cuda,
            max_procs: config.max_piper_procs,
        },
    ));

    let health_controller = Arc::new(HealthController::new(
        config.default_voice.clone(),
        config.streaming,
        installer,
    ));
    let events_controller = Arc::new(EventsController::new(
        backend,
        Arc::new(config.session_settings()),
        info,
    ));

    start_http_server(&config, health_controller, events_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "piper_stream_server=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "piper_stream_server=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
