//! The conversation loop: transcript, turn-taking and reflection state.

pub mod greeting;
pub mod messages;
pub mod orchestrator;

pub use greeting::greeting;
pub use messages::{Message, ReflectionContext, Sender, TurnType};
pub use orchestrator::{ConversationState, Orchestrator, PendingTurn, TurnOutcome, TurnToken};
