use super::synthesis_backend::{speaker_override, SynthesisBackend};
use crate::domain::synthesis::SynthesisParams;
use crate::domain::voice::{SynthesizedAudio, VoiceResolver, VoiceSelector};
use crate::error::{AppError, AppResult};
use crate::infrastructure::audio::read_wav_file;
use crate::infrastructure::voices::{AssetInstaller, VoiceConfigFile, VoiceFiles};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, Mutex};
use tracing::Instrument;

/// How long to wait for a `Wrote` line after piper logged something else
const STDERR_SETTLE: Duration = Duration::from_millis(100);

/// How worker processes are started
#[derive(Debug, Clone)]
pub struct PiperSettings {
    pub piper_path: PathBuf,
    pub params: SynthesisParams,
    pub use_cuda: bool,
    /// Upper bound on live processes, `0` for no limit
    pub max_procs: usize,
}

/// One line of `--json-input`
#[derive(Debug, Serialize)]
struct PiperInput<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker_id: Option<i64>,
}

/// A running `piper` bound to one voice
struct PiperProcess {
    key: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    // Lines drained from stderr by a background task
    stderr_lines: mpsc::UnboundedReceiver<String>,
    speaker_id_map: HashMap<String, i64>,
    // Removed with the process
    _output_dir: TempDir,
    last_used: Instant,
}

impl PiperProcess {
    async fn spawn(settings: &PiperSettings, files: &VoiceFiles) -> AppResult<Self> {
        let voice_config = VoiceConfigFile::load(&files.config_path).await?;
        let output_dir = tempfile::Builder::new().prefix("piper-").tempdir()?;

        let mut command = Command::new(&settings.piper_path);
        command
            .arg("--model")
            .arg(&files.model_path)
            .arg("--config")
            .arg(&files.config_path)
            .arg("--output_dir")
            .arg(output_dir.path())
            .arg("--json-input");

        if let Some(length_scale) = settings.params.length_scale {
            command.arg("--length_scale").arg(length_scale.to_string());
        }
        if let Some(noise_scale) = settings.params.noise_scale {
            command.arg("--noise_scale").arg(noise_scale.to_string());
        }
        if let Some(noise_w) = settings.params.noise_w {
            command.arg("--noise_w").arg(noise_w.to_string());
        }
        if settings.use_cuda {
            command.arg("--cuda");
        }

        tracing::info!(
            voice = %files.key,
            piper = %settings.piper_path.display(),
            output_dir = %output_dir.path().display(),
            "Starting piper process"
        );

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::Backend(format!(
                    "Failed to start {}: {}",
                    settings.piper_path.display(),
                    e
                ))
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
            return Err(AppError::Backend("piper pipes unavailable".to_string()));
        };

        Ok(Self {
            key: files.key.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr_lines: forward_stderr(&files.key, stderr),
            speaker_id_map: voice_config.speaker_id_map,
            _output_dir: output_dir,
            last_used: Instant::now(),
        })
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Send one request and return the path of the WAV file piper wrote
    async fn request(&mut self, text: &str, speaker_id: Option<i64>) -> AppResult<PathBuf> {
        let mut line = serde_json::to_string(&PiperInput { text, speaker_id })
            .map_err(|e| AppError::Backend(format!("Failed to encode piper input: {}", e)))?;
        line.push('\n');

        // Logs left over from earlier requests
        while self.stderr_lines.try_recv().is_ok() {}

        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let mut stdout_line = String::new();
        self.stdout.read_line(&mut stdout_line).await?;
        let output_path = stdout_line.trim();
        if !output_path.is_empty() {
            return Ok(PathBuf::from(output_path));
        }

        // Newer piper builds only log "INFO:__main__:Wrote /path/to/file.wav" to stderr
        let mut last_line = self.stderr_lines.recv().await;
        while let Some(stderr_line) = &last_line {
            if let Some(path) = parse_wrote_line(stderr_line) {
                return Ok(PathBuf::from(path));
            }
            match tokio::time::timeout(STDERR_SETTLE, self.stderr_lines.recv()).await {
                Ok(Some(next)) => last_line = Some(next),
                Ok(None) | Err(_) => break,
            }
        }

        let stderr_line = last_line.unwrap_or_default();
        tracing::error!(
            voice = %self.key,
            stderr = stderr_line.trim(),
            "piper failed to generate audio file"
        );
        Err(AppError::Backend(format!(
            "piper produced no audio for voice {}: {}",
            self.key,
            stderr_line.trim()
        )))
    }

    async fn stop(mut self) {
        tracing::debug!(voice = %self.key, "Stopping piper process");
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(voice = %self.key, error = %e, "piper already exited");
        }
        if let Err(e) = self.child.wait().await {
            tracing::warn!(voice = %self.key, error = %e, "Failed to reap piper process");
        }
    }
}

/// Keep reading stderr for the life of the process so piper never blocks on
/// a full pipe.
fn forward_stderr(key: &str, stderr: ChildStderr) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let span = tracing::debug_span!("piper_stderr", voice = %key);

    tokio::spawn(
        async move {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        tracing::debug!(stderr = line.trim(), "piper stderr");
                        // The receiver goes away with the process; keep draining regardless
                        let _ = tx.send(line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(error = %e, "piper stderr closed");
                        break;
                    }
                }
            }
        }
        .instrument(span),
    );

    rx
}

fn parse_wrote_line(line: &str) -> Option<&str> {
    line.split_once("Wrote ")
        .map(|(_, path)| path.trim())
        .filter(|path| !path.is_empty())
}

/// Deletes a result file once it goes out of scope, whatever happened to it
struct ResultFile(PathBuf);

impl ResultFile {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ResultFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            tracing::warn!(path = %self.0.display(), error = %e, "Failed to remove result file");
        }
    }
}

/// Backend driving long-lived `piper --json-input` processes, one per voice.
///
/// When a new voice would exceed `max_procs`, the least recently used
/// process is stopped first. A single lock covers process lookup, spawning
/// and the request itself.
pub struct PiperProcessPool {
    resolver: VoiceResolver,
    installer: Arc<dyn AssetInstaller>,
    settings: PiperSettings,
    processes: Mutex<HashMap<String, PiperProcess>>,
}

impl PiperProcessPool {
    pub fn new(
        resolver: VoiceResolver,
        installer: Arc<dyn AssetInstaller>,
        settings: PiperSettings,
    ) -> Self {
        Self {
            resolver,
            installer,
            settings,
            processes: Mutex::new(HashMap::new()),
        }
    }

    /// Keys of the voices with a live process
    pub async fn running_voices(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.processes.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Return the process for `key`, starting one if needed. Caller holds the pool lock.
    async fn get_process<'a>(
        &self,
        processes: &'a mut HashMap<String, PiperProcess>,
        key: &str,
    ) -> AppResult<&'a mut PiperProcess> {
        let running = processes
            .get_mut(key)
            .map(PiperProcess::is_running)
            .unwrap_or(false);

        if !running {
            if let Some(exited) = processes.remove(key) {
                tracing::warn!(voice = key, "piper process exited, restarting");
                exited.stop().await;
            }

            if self.settings.max_procs > 0 {
                while processes.len() >= self.settings.max_procs {
                    let Some(lru_key) = processes
                        .iter()
                        .min_by_key(|(_, process)| process.last_used)
                        .map(|(lru_key, _)| lru_key.clone())
                    else {
                        break;
                    };
                    if let Some(lru) = processes.remove(&lru_key) {
                        lru.stop().await;
                    }
                }
            }

            let files = self.installer.ensure_voice(key).await?;
            let process = PiperProcess::spawn(&self.settings, &files).await?;
            processes.insert(key.to_string(), process);
        }

        let process = processes
            .get_mut(key)
            .ok_or_else(|| AppError::Backend(format!("No piper process for {}", key)))?;
        process.last_used = Instant::now();
        Ok(process)
    }
}

#[async_trait]
impl SynthesisBackend for PiperProcessPool {
    async fn synthesize(&self, text: &str, voice: &VoiceSelector) -> AppResult<SynthesizedAudio> {
        let resolved = self.resolver.resolve(voice);

        let mut processes = self.processes.lock().await;
        let process = self.get_process(&mut processes, &resolved.key).await?;
        let speaker_id = speaker_override(&process.speaker_id_map, &resolved);

        tracing::debug!(voice = %resolved.key, ?speaker_id, text, "Synthesizing");
        // Read before releasing the lock: evicting the process removes its output dir
        let result = ResultFile(process.request(text, speaker_id).await?);
        tracing::debug!(path = %result.path().display(), "piper output");
        read_wav_file(result.path()).await
    }
}
