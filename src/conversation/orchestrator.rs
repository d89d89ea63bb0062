//! Turn-taking state machine.
//!
//! ```text
//!            start_listening            begin_turn
//!   Idle ───────────────────▶ Listening ──────────▶ Processing
//!    ▲  ◀─────────────────── │                        │
//!    │    stop / error / end                          │ complete_turn
//!    │                                                ▼
//!    └──────────── speech_finished ──────────── Speaking
//! ```
//!
//! Failed turns go straight from Processing to Idle. Each turn carries a
//! [`TurnToken`]; a completion whose token is not the one in flight is
//! dropped without touching state, so a late reply can never land in a
//! newer turn. Speech completions are matched the same way against the
//! current [`UtteranceId`](crate::speech::UtteranceId).

use super::greeting::greeting;
use super::messages::{Message, ReflectionContext, TurnType};
use crate::chat::{ChatClient, ChatReply, ChatRequest};
use crate::config::{ConversationConfig, SamanthaConfig, VoiceConfig};
use crate::emotion::{DisplayEmotion, EmotionDetector, EmotionState};
use crate::error::{Result, SamanthaError};
use crate::memory::{MemoryRecord, MemoryStore};
use crate::runtime::{ConversationEvent, Notice};
use crate::speech::{Prosody, RecognitionEvent, SpeechCapture, SpeechOutput, SynthesisEvent};
use chrono::{DateTime, Local, Timelike};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Where the loop is in a turn.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}

impl ConversationState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Speaking => "speaking",
        }
    }
}

/// Identifies one in-flight chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnToken(u64);

/// A turn waiting on the chat backend.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub token: TurnToken,
    pub request: ChatRequest,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply was appended (and spoken if voice output is on).
    Replied,
    /// The backend failed; the fallback apology was appended.
    Failed,
    /// The completion belonged to a turn that is no longer in flight.
    Stale,
    /// The input was blank or arrived while busy.
    Ignored,
}

struct InFlight {
    token: TurnToken,
    transcript: String,
    emotion: EmotionState,
}

/// Drives capture, emotion detection, the chat call, memory and speech for
/// one conversation.
pub struct Orchestrator {
    state: ConversationState,
    messages: Vec<Message>,
    reflection: Option<ReflectionContext>,
    last_emotion: Option<EmotionState>,
    capture: SpeechCapture,
    output: SpeechOutput,
    chat: Arc<dyn ChatClient>,
    detector: Arc<dyn EmotionDetector>,
    memory: Option<MemoryStore>,
    voice: VoiceConfig,
    conversation: ConversationConfig,
    voice_enabled: bool,
    next_token: u64,
    in_flight: Option<InFlight>,
    events: Option<broadcast::Sender<ConversationEvent>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        capture: SpeechCapture,
        output: SpeechOutput,
        chat: Arc<dyn ChatClient>,
        detector: Arc<dyn EmotionDetector>,
        config: &SamanthaConfig,
    ) -> Self {
        Self {
            state: ConversationState::Idle,
            messages: Vec::new(),
            reflection: None,
            last_emotion: None,
            capture,
            output,
            chat,
            detector,
            memory: None,
            voice: config.voice.clone(),
            conversation: config.conversation.clone(),
            voice_enabled: config.voice.enabled,
            next_token: 0,
            in_flight: None,
            events: None,
        }
    }

    /// Persist completed turns to `store`.
    #[must_use]
    pub fn with_memory(mut self, store: MemoryStore) -> Self {
        self.memory = Some(store);
        self
    }

    /// Attach an event broadcaster for renderers.
    #[must_use]
    pub fn with_events(mut self, tx: broadcast::Sender<ConversationEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    #[must_use]
    pub fn state(&self) -> ConversationState {
        self.state
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn reflection(&self) -> Option<&ReflectionContext> {
        self.reflection.as_ref()
    }

    /// Emotion detected for the most recent user utterance.
    #[must_use]
    pub fn last_emotion(&self) -> Option<&EmotionState> {
        self.last_emotion.as_ref()
    }

    #[must_use]
    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    #[must_use]
    pub fn memory(&self) -> Option<&MemoryStore> {
        self.memory.as_ref()
    }

    // ── Capture ─────────────────────────────────────────────────────────

    /// Idle → Listening. Returns whether capture started.
    pub fn start_listening(&mut self) -> bool {
        if self.state != ConversationState::Idle {
            debug!("start_listening ignored while {}", self.state.as_str());
            return false;
        }
        match self.capture.start() {
            Ok(()) => {
                self.set_state(ConversationState::Listening);
                true
            }
            Err(SamanthaError::CaptureUnavailable(reason)) => {
                warn!("capture unavailable: {reason}");
                self.notice(Notice::CaptureUnavailable);
                false
            }
            Err(e) => {
                self.notice(Notice::RecognitionFailed(e.to_string()));
                false
            }
        }
    }

    /// Listening → Idle.
    pub fn stop_listening(&mut self) {
        if self.state == ConversationState::Listening {
            self.capture.stop();
            self.set_state(ConversationState::Idle);
        }
    }

    /// Orb click: stop when listening, start when idle, otherwise nothing.
    pub fn toggle(&mut self) {
        match self.state {
            ConversationState::Listening => self.stop_listening(),
            ConversationState::Idle => {
                self.start_listening();
            }
            ConversationState::Processing | ConversationState::Speaking => {}
        }
    }

    /// Recognition failed; back to Idle. Logged only.
    pub fn capture_failed(&mut self, reason: &str) {
        warn!("capture failed: {reason}");
        self.capture.stop();
        if self.state == ConversationState::Listening {
            self.set_state(ConversationState::Idle);
        }
    }

    /// Feed a recognizer callback. A final transcript starts a turn.
    pub async fn handle_recognition(&mut self, event: RecognitionEvent) -> Option<PendingTurn> {
        if let RecognitionEvent::Error(reason) = &event {
            let reason = reason.clone();
            self.capture.handle(event);
            self.capture_failed(&reason);
            return None;
        }
        if let Some(transcript) = self.capture.handle(event) {
            return self.begin_turn(&transcript).await;
        }
        if self.state == ConversationState::Listening && !self.capture.is_listening() {
            self.set_state(ConversationState::Idle);
        }
        None
    }

    // ── Turns ───────────────────────────────────────────────────────────

    /// Start a turn for `transcript`.
    ///
    /// Accepted from Idle or Listening. Returns `None` for blank input or
    /// while a turn is already Processing or Speaking.
    pub async fn begin_turn(&mut self, transcript: &str) -> Option<PendingTurn> {
        if matches!(
            self.state,
            ConversationState::Processing | ConversationState::Speaking
        ) {
            debug!("transcript ignored while {}", self.state.as_str());
            return None;
        }
        let text = transcript.trim();
        if text.is_empty() {
            self.stop_listening();
            return None;
        }

        self.capture.stop();
        self.set_state(ConversationState::Processing);
        self.push_message(Message::user(text));

        let emotion = self.detector.detect(text).await;
        debug!("{}", emotion.context_line());
        self.last_emotion = Some(emotion.clone());
        self.emit(ConversationEvent::EmotionDetected(emotion.clone()));

        let history = &self.messages[..self.messages.len() - 1];
        let request = ChatRequest::new(text, history)
            .with_reflection(self.reflection.clone())
            .with_emotional_context(Some(emotion.clone()));

        let token = TurnToken(self.next_token);
        self.next_token += 1;
        self.in_flight = Some(InFlight {
            token,
            transcript: text.to_owned(),
            emotion,
        });
        Some(PendingTurn { token, request })
    }

    /// Finish the turn identified by `token` at the current local time.
    pub fn complete_turn(&mut self, token: TurnToken, result: Result<ChatReply>) -> TurnOutcome {
        self.complete_turn_at(token, result, Local::now())
    }

    /// Finish the turn identified by `token` as if it completed at `now`.
    pub fn complete_turn_at(
        &mut self,
        token: TurnToken,
        result: Result<ChatReply>,
        now: DateTime<Local>,
    ) -> TurnOutcome {
        let Some(turn) = self.in_flight.take_if(|t| t.token == token) else {
            debug!("discarding stale completion {token:?}");
            return TurnOutcome::Stale;
        };

        match result {
            Ok(reply) => {
                self.push_message(Message::assistant(
                    reply.text.clone(),
                    Some(reply.emotion),
                    reply.turn_type,
                ));
                let reflection = (reply.turn_type == TurnType::Reflection).then(|| {
                    ReflectionContext {
                        question: reply.text.clone(),
                    }
                });
                self.set_reflection(reflection);
                self.remember(&turn, &reply.text, now);

                let prosody =
                    Prosody::for_turn(Some(turn.emotion.sentiment), now.hour(), &self.voice);
                if self.say(&reply.text, prosody) {
                    self.set_state(ConversationState::Speaking);
                } else {
                    self.set_state(ConversationState::Idle);
                }
                TurnOutcome::Replied
            }
            Err(e) => {
                warn!("chat turn failed: {e}");
                self.notice(Notice::ChatFailed(e.to_string()));
                let apology = self.conversation.fallback_message.clone();
                self.push_message(Message::assistant(
                    apology.clone(),
                    Some(DisplayEmotion::Neutral),
                    TurnType::Standard,
                ));
                self.set_reflection(None);
                if self.conversation.speak_fallback {
                    self.say(&apology, Prosody::NEUTRAL);
                }
                self.set_state(ConversationState::Idle);
                TurnOutcome::Failed
            }
        }
    }

    /// Run a whole turn: begin, call the backend, complete.
    pub async fn handle_transcript(&mut self, transcript: &str) -> TurnOutcome {
        let Some(pending) = self.begin_turn(transcript).await else {
            return TurnOutcome::Ignored;
        };
        let chat = Arc::clone(&self.chat);
        let result = chat.send(&pending.request).await;
        self.complete_turn(pending.token, result)
    }

    /// The chat client turns are sent through.
    #[must_use]
    pub fn chat_client(&self) -> Arc<dyn ChatClient> {
        Arc::clone(&self.chat)
    }

    // ── Speech ──────────────────────────────────────────────────────────

    /// Speaking → Idle.
    pub fn speech_finished(&mut self) {
        self.output.finished();
        if self.state == ConversationState::Speaking {
            self.set_state(ConversationState::Idle);
        }
    }

    /// Feed an output backend completion. Completions for an utterance
    /// that has since been cancelled or replaced are ignored.
    pub fn handle_synthesis(&mut self, event: SynthesisEvent) {
        let id = event.id();
        if !self.output.complete(id) {
            debug!("ignoring completion for superseded utterance {id:?}");
            return;
        }
        if let SynthesisEvent::Failed(_, reason) = event {
            warn!("speech output failed: {reason}");
            self.notice(Notice::SpeechFailed(reason));
        }
        if self.state == ConversationState::Speaking {
            self.set_state(ConversationState::Idle);
        }
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
        info!("voice output {}", if enabled { "on" } else { "off" });
        if !enabled {
            self.output.cancel();
            if self.state == ConversationState::Speaking {
                self.set_state(ConversationState::Idle);
            }
        }
    }

    /// Append and speak the opening line for local `hour`.
    pub fn greet(&mut self, hour: u32) {
        let has_history = match &self.memory {
            Some(store) => match store.is_empty() {
                Ok(empty) => !empty,
                Err(e) => {
                    self.notice(Notice::MemoryFailed(e.to_string()));
                    false
                }
            },
            None => false,
        };
        let line = greeting(hour, has_history);
        self.set_reflection(None);
        self.push_message(Message::assistant(
            line,
            Some(DisplayEmotion::Happy),
            TurnType::Standard,
        ));
        if self.state == ConversationState::Idle
            && self.say(line, Prosody::for_turn(None, hour, &self.voice))
        {
            self.set_state(ConversationState::Speaking);
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn say(&mut self, text: &str, prosody: Prosody) -> bool {
        if !self.voice_enabled {
            return false;
        }
        match self.output.speak(text, prosody) {
            Ok(_) => true,
            Err(SamanthaError::SynthesisUnavailable(_)) => {
                self.notice(Notice::SynthesisUnavailable);
                false
            }
            Err(e) => {
                warn!("could not speak reply: {e}");
                self.notice(Notice::SpeechFailed(e.to_string()));
                false
            }
        }
    }

    fn remember(&self, turn: &InFlight, reply: &str, now: DateTime<Local>) {
        let Some(store) = &self.memory else {
            return;
        };
        let record =
            MemoryRecord::capture(&turn.transcript, reply, Some(turn.emotion.clone()), now);
        if let Err(e) = store.append(record) {
            warn!("failed to save memory: {e}");
            self.notice(Notice::MemoryFailed(e.to_string()));
        }
    }

    fn set_state(&mut self, state: ConversationState) {
        if self.state != state {
            debug!("state {} → {}", self.state.as_str(), state.as_str());
            self.state = state;
            self.emit(ConversationEvent::StateChanged(state));
        }
    }

    fn set_reflection(&mut self, reflection: Option<ReflectionContext>) {
        if self.reflection != reflection {
            self.reflection = reflection.clone();
            self.emit(ConversationEvent::ReflectionChanged(reflection));
        }
    }

    fn push_message(&mut self, message: Message) {
        self.messages.push(message.clone());
        self.emit(ConversationEvent::MessageAdded(message));
    }

    fn notice(&self, notice: Notice) {
        self.emit(ConversationEvent::Notice(notice));
    }

    fn emit(&self, event: ConversationEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
