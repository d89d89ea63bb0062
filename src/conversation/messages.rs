//! Message types owned by the conversation loop.

use crate::emotion::DisplayEmotion;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    /// Serialized as `ai`, the name the chat backend expects in history.
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

impl Sender {
    /// Human-readable role name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Whether an assistant turn poses a question the user should answer next.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnType {
    #[default]
    Standard,
    Reflection,
}

/// One chat bubble. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub emotion: Option<DisplayEmotion>,
    pub turn_type: TurnType,
}

impl Message {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::User,
            text: text.into(),
            emotion: None,
            turn_type: TurnType::Standard,
        }
    }

    #[must_use]
    pub fn assistant(
        text: impl Into<String>,
        emotion: Option<DisplayEmotion>,
        turn_type: TurnType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Assistant,
            text: text.into(),
            emotion,
            turn_type,
        }
    }
}

/// The question awaiting a direct answer after a reflection turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionContext {
    pub question: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn user_messages_carry_no_emotion() {
        let m = Message::user("hello");
        assert_eq!(m.sender, Sender::User);
        assert!(m.emotion.is_none());
        assert_eq!(m.turn_type, TurnType::Standard);
    }

    #[test]
    fn assistant_sender_uses_backend_wire_name() {
        let json = serde_json::to_string(&Sender::Assistant).unwrap_or_default();
        assert_eq!(json, "\"ai\"");
        let s: Sender = serde_json::from_str("\"assistant\"").unwrap_or(Sender::User);
        assert_eq!(s, Sender::Assistant);
    }
}
