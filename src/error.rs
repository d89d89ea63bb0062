//! Error types for the samantha companion.

/// Top-level error type for the voice companion.
#[derive(Debug, thiserror::Error)]
pub enum SamanthaError {
    /// The host has no speech-to-text capability.
    #[error("speech capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// Speech recognition failed mid-utterance.
    #[error("recognition error: {0}")]
    Recognition(String),

    /// The host has no text-to-speech capability.
    #[error("speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// Text-to-speech playback error.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Remote chat or emotion endpoint error.
    #[error("chat error: {0}")]
    Chat(String),

    /// Memory log storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SamanthaError>;
