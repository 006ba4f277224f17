/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid event: {0}")]
    Protocol(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Synthesis backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid audio data: {0}")]
    Audio(#[from] hound::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Connection closed")]
    ConnectionClosed,
}

impl AppError {
    /// Classification code sent to clients in `error` events
    pub fn code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "ProtocolError",
            Self::VoiceNotFound(_) => "VoiceResolutionError",
            Self::Backend(_) | Self::Audio(_) => "BackendError",
            Self::Io(_) => "IOError",
            Self::Config(_) => "ConfigError",
            Self::ConnectionClosed => "ConnectionClosed",
        }
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
