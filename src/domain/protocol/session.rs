use super::audio::audio_chunks;
use super::events::{ClientEvent, ServerEvent, Synthesize};
use super::info::Info;
use crate::domain::segmentation::SentenceBoundaryDetector;
use crate::domain::synthesis::normalize_text;
use crate::domain::voice::{AudioFormat, SynthesizedAudio, VoiceSelector};
use crate::error::{AppError, AppResult};
use crate::infrastructure::backends::SynthesisBackend;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-server settings every session reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Terminal punctuation appended when missing; empty disables it
    pub auto_punctuation: String,
    /// Sample frames per `audio-chunk`
    pub samples_per_chunk: usize,
    /// Whether `synthesize-start/chunk/stop` are honored
    pub streaming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    Streaming,
}

/// Protocol state of one connection.
///
/// Events are handled one at a time; every synthesis an event triggers has
/// finished and its audio has been queued before `handle_event` returns.
pub struct Session {
    backend: Arc<dyn SynthesisBackend>,
    settings: Arc<SessionSettings>,
    info: Arc<Info>,
    events: mpsc::Sender<ServerEvent>,
    mode: SessionMode,
    detector: SentenceBoundaryDetector,
    pending_voice: VoiceSelector,
}

impl Session {
    pub fn new(
        backend: Arc<dyn SynthesisBackend>,
        settings: Arc<SessionSettings>,
        info: Arc<Info>,
        events: mpsc::Sender<ServerEvent>,
    ) -> Self {
        Self {
            backend,
            settings,
            info,
            events,
            mode: SessionMode::Idle,
            detector: SentenceBoundaryDetector::new(),
            pending_voice: VoiceSelector::default(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Handle one client event.
    ///
    /// A failure is reported to the client as one `error` event and then
    /// returned; the caller is expected to close the connection.
    pub async fn handle_event(&mut self, event: ClientEvent) -> AppResult<()> {
        if event == ClientEvent::Describe {
            self.send(ServerEvent::Info(self.info.as_ref().clone()))
                .await?;
            tracing::debug!("Sent info");
            return Ok(());
        }

        tracing::debug!(event = event.event_type(), mode = ?self.mode, "Handling event");
        match self.dispatch(event).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.report_error(err).await),
        }
    }

    /// Send `err` to the client as an `error` event and hand it back
    pub async fn report_error(&self, err: AppError) -> AppError {
        if matches!(err, AppError::ConnectionClosed) {
            return err;
        }
        tracing::error!(error = %err, code = err.code(), "Event failed");
        // The client may already be gone
        let _ = self.send(ServerEvent::error(&err)).await;
        err
    }

    async fn dispatch(&mut self, event: ClientEvent) -> AppResult<()> {
        match (self.mode, event) {
            (SessionMode::Idle, ClientEvent::Synthesize(synthesize)) => {
                self.synthesize_batch(synthesize).await
            }
            // Clients also send the whole text as `synthesize` inside a stream
            (SessionMode::Streaming, ClientEvent::Synthesize(_)) => Ok(()),
            (_, ClientEvent::SynthesizeStart(start)) if self.settings.streaming => {
                self.mode = SessionMode::Streaming;
                self.detector = SentenceBoundaryDetector::new();
                self.pending_voice = start.voice.unwrap_or_default();
                tracing::debug!(voice = ?self.pending_voice, "Text stream started");
                Ok(())
            }
            (SessionMode::Streaming, ClientEvent::SynthesizeChunk(chunk)) => {
                let sentences: Vec<String> = self.detector.add_chunk(&chunk.text).collect();
                let voice = self.pending_voice.clone();
                for sentence in sentences {
                    tracing::debug!(sentence = %sentence, "Synthesizing stream sentence");
                    self.stream_sentence(&sentence, &voice).await?;
                }
                Ok(())
            }
            (SessionMode::Streaming, ClientEvent::SynthesizeStop) => {
                let rest = self.detector.finish();
                let voice = std::mem::take(&mut self.pending_voice);
                self.mode = SessionMode::Idle;
                if !rest.is_empty() {
                    self.stream_sentence(&rest, &voice).await?;
                }
                self.send(ServerEvent::SynthesizeStopped).await?;
                tracing::debug!("Text stream stopped");
                Ok(())
            }
            (mode, event) => {
                tracing::debug!(?mode, event = event.event_type(), "Ignoring event");
                Ok(())
            }
        }
    }

    /// One closed request: every sentence goes into a single audio stream
    async fn synthesize_batch(&mut self, request: Synthesize) -> AppResult<()> {
        let voice = request.voice.unwrap_or_default();
        let mut detector = SentenceBoundaryDetector::new();
        let mut sentences: Vec<String> = detector.add_chunk(&request.text).collect();
        let rest = detector.finish();
        if !rest.is_empty() {
            sentences.push(rest);
        }

        let mut started = false;
        for sentence in &sentences {
            let audio = self.synthesize(sentence, &voice).await?;
            if !started {
                self.send(ServerEvent::audio_start(audio.format)).await?;
                started = true;
            }
            self.send_chunks(&audio).await?;
        }

        if !started {
            self.send(ServerEvent::audio_start(AudioFormat::PIPER_DEFAULT))
                .await?;
        }
        self.send(ServerEvent::AudioStop).await?;
        tracing::debug!(sentences = sentences.len(), "Completed request");
        Ok(())
    }

    /// A complete start/chunks/stop stream for one sentence
    async fn stream_sentence(&self, sentence: &str, voice: &VoiceSelector) -> AppResult<()> {
        let audio = self.synthesize(sentence, voice).await?;
        self.send(ServerEvent::audio_start(audio.format)).await?;
        self.send_chunks(&audio).await?;
        self.send(ServerEvent::AudioStop).await
    }

    async fn synthesize(&self, text: &str, voice: &VoiceSelector) -> AppResult<SynthesizedAudio> {
        let normalized = normalize_text(text, &self.settings.auto_punctuation);
        tracing::debug!(raw_text = text, text = normalized.as_str(), "synthesize");
        self.backend.synthesize(&normalized, voice).await
    }

    async fn send_chunks(&self, audio: &SynthesizedAudio) -> AppResult<()> {
        for chunk in audio_chunks(audio, self.settings.samples_per_chunk) {
            self.send(chunk).await?;
        }
        Ok(())
    }

    async fn send(&self, event: ServerEvent) -> AppResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AppError::ConnectionClosed)
    }
}
