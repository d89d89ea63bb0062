//! Remote chat client.
//!
//! The conversation loop talks to the backend chat route through the
//! [`ChatClient`] trait. [`HttpChatClient`] is the production
//! implementation; tests substitute scripted fakes.
//!
//! Request body:
//!
//! ```json
//! {
//!   "message": "I'm really happy today",
//!   "history": [{"sender": "ai", "text": "Hello, I'm Samantha."}],
//!   "reflectionAnswer": {"question": "What made today special?"},
//!   "emotionalContext": {"sentiment": "positive", "emotions": ["joy"], "intensity": 10}
//! }
//! ```
//!
//! `reflectionAnswer` and `emotionalContext` are omitted when absent. The
//! emotional context travels as its own field so the message text stays
//! exactly what the user said.

mod emotion_client;
mod http;

pub use emotion_client::HttpEmotionClient;
pub use http::HttpChatClient;

use crate::conversation::messages::{Message, ReflectionContext, Sender, TurnType};
use crate::emotion::{DisplayEmotion, EmotionState};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One prior exchange entry as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub text: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            sender: message.sender,
            text: message.text.clone(),
        }
    }
}

/// Payload for one chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's latest utterance.
    pub message: String,
    /// Every message before `message`, oldest first.
    pub history: Vec<HistoryEntry>,
    /// Set when the user is answering a reflection question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_answer: Option<ReflectionContext>,
    /// Heuristic read of the user's mood for this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotional_context: Option<EmotionState>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>, history: &[Message]) -> Self {
        Self {
            message: message.into(),
            history: history.iter().map(HistoryEntry::from).collect(),
            reflection_answer: None,
            emotional_context: None,
        }
    }

    #[must_use]
    pub fn with_reflection(mut self, reflection: Option<ReflectionContext>) -> Self {
        self.reflection_answer = reflection;
        self
    }

    #[must_use]
    pub fn with_emotional_context(mut self, emotion: Option<EmotionState>) -> Self {
        self.emotional_context = emotion;
        self
    }
}

/// The assistant's completed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub emotion: DisplayEmotion,
    pub turn_type: TurnType,
}

impl ChatReply {
    #[must_use]
    pub fn standard(text: impl Into<String>, emotion: DisplayEmotion) -> Self {
        Self {
            text: text.into(),
            emotion,
            turn_type: TurnType::Standard,
        }
    }

    #[must_use]
    pub fn reflection(question: impl Into<String>) -> Self {
        Self {
            text: question.into(),
            emotion: DisplayEmotion::Curious,
            turn_type: TurnType::Reflection,
        }
    }
}

/// Single request/response call to the chat backend.
///
/// Any failure (transport, non-success status, undecodable body) is
/// reported as one error; callers do not retry.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// Structured reply body from the chat route.
#[derive(Debug, Deserialize)]
struct StructuredReply {
    response: String,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default, rename = "type")]
    turn_type: Option<String>,
}

impl From<StructuredReply> for ChatReply {
    fn from(raw: StructuredReply) -> Self {
        let emotion = raw
            .emotion
            .as_deref()
            .and_then(DisplayEmotion::parse)
            .unwrap_or_default();
        let turn_type = match raw.turn_type.as_deref() {
            Some("reflection") => TurnType::Reflection,
            _ => TurnType::Standard,
        };
        Self {
            text: raw.response,
            emotion,
            turn_type,
        }
    }
}
