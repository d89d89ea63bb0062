//! Samantha: a voice-driven, emotionally aware chat companion.
//!
//! One conversation turn flows through:
//! Speech capture → emotion heuristic → remote chat → memory log → speech output
//!
//! # Architecture
//!
//! - **Conversation**: [`Orchestrator`] owns the transcript and the
//!   Idle / Listening / Processing / Speaking state machine
//! - **Emotion**: keyword heuristic producing sentiment, tags and intensity
//! - **Chat**: [`ChatClient`] seam over the backend route (`reqwest`)
//! - **Memory**: capacity-bounded JSON log of completed turns
//! - **Speech**: recognizer / synthesizer backends behind small traits,
//!   with terminal implementations for the CLI
//! - **Presentation**: plain-text bubbles and panels

pub mod chat;
pub mod config;
pub mod conversation;
pub mod emotion;
pub mod error;
pub mod memory;
pub mod presentation;
pub mod runtime;
pub mod samantha_dirs;
pub mod speech;

pub use chat::{ChatClient, ChatReply, ChatRequest, HttpChatClient, HttpEmotionClient};
pub use config::SamanthaConfig;
pub use conversation::{ConversationState, Orchestrator, TurnOutcome};
pub use emotion::{EmotionDetector, EmotionState, KeywordEmotionDetector, analyze};
pub use error::{Result, SamanthaError};
pub use memory::{MemoryRecord, MemoryStore};
pub use runtime::{ConversationEvent, Notice};
