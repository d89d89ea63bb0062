//! Events emitted by the conversation loop for renderers and logging.
//!
//! Payloads are small clones so the loop can broadcast without waiting on
//! slow subscribers.

use crate::conversation::{ConversationState, Message, ReflectionContext};
use crate::emotion::EmotionState;

/// What the conversation loop just did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// The orb state moved.
    StateChanged(ConversationState),
    /// A bubble was appended to the transcript.
    MessageAdded(Message),
    /// The user's latest utterance was classified.
    EmotionDetected(EmotionState),
    /// The pending reflection question was set or cleared.
    ReflectionChanged(Option<ReflectionContext>),
    /// Something the user should be told about that is not a chat bubble.
    Notice(Notice),
}

/// Non-fatal conditions surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The host has no speech recognizer.
    CaptureUnavailable,
    /// The host has no speech synthesizer; replies are shown but not spoken.
    SynthesisUnavailable,
    /// Capture could not be started. Errors during a session are only
    /// logged.
    RecognitionFailed(String),
    /// A reply could not be spoken.
    SpeechFailed(String),
    /// The chat backend failed; the fallback apology was shown instead.
    ChatFailed(String),
    /// The memory log could not be read or written.
    MemoryFailed(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CaptureUnavailable => {
                f.write_str("Speech recognition is not available here. Type your message instead.")
            }
            Self::SynthesisUnavailable => {
                f.write_str("Speech output is not available here. Replies will be shown only.")
            }
            Self::RecognitionFailed(e) => write!(f, "I couldn't start listening ({e})."),
            Self::SpeechFailed(e) => write!(f, "I couldn't say that out loud ({e})."),
            Self::ChatFailed(e) => write!(f, "Chat backend unavailable: {e}"),
            Self::MemoryFailed(e) => write!(f, "Memory log problem: {e}"),
        }
    }
}
