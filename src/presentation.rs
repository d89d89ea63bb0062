//! Plain-text renderings of the conversation for terminal output.
//!
//! Everything here is a pure function of orchestrator or memory state; the
//! CLI decides when to print.

use crate::conversation::{ConversationState, Message, ReflectionContext, Sender, TurnType};
use crate::emotion::EmotionState;
use crate::memory::MemoryRecord;
use chrono::Local;

/// Shown in place of the memory list when the log is empty.
pub const EMPTY_MEMORY_TEXT: &str = "No memories yet. Start a conversation!";

/// Memory panel previews are cut to this many characters.
const PREVIEW_CHARS: usize = 60;

/// Label for the orb in `state`.
#[must_use]
pub fn orb_label(state: ConversationState) -> &'static str {
    match state {
        ConversationState::Idle => "Ready. Press Enter or type to talk.",
        ConversationState::Listening => "Listening...",
        ConversationState::Processing => "Thinking...",
        ConversationState::Speaking => "Speaking...",
    }
}

/// Whether the orb accepts a click in `state`.
#[must_use]
pub fn orb_enabled(state: ConversationState) -> bool {
    matches!(
        state,
        ConversationState::Idle | ConversationState::Listening
    )
}

/// One chat bubble as a line of text.
#[must_use]
pub fn render_bubble(message: &Message) -> String {
    format!("{}: {}", speaker_label(message), message.text)
}

/// `You`, or `Samantha (mood)` with a `?` marker on reflection questions.
#[must_use]
pub fn speaker_label(message: &Message) -> String {
    match message.sender {
        Sender::User => "You".to_owned(),
        Sender::Assistant => {
            let mood = message.emotion.unwrap_or_default();
            let marker = if message.turn_type == TurnType::Reflection {
                " ?"
            } else {
                ""
            };
            format!("Samantha ({}){marker}", mood.as_str())
        }
    }
}

/// A reply being shown chunk by chunk.
///
/// Once the finished bubble arrives only its speaker label is added, unless
/// the bubble says something other than what was streamed (a fallback
/// apology after a broken stream).
#[derive(Debug, Default)]
pub struct StreamedReply {
    shown: String,
}

impl StreamedReply {
    /// Text to print for `chunk`. The first chunk is indented like a bubble.
    pub fn push(&mut self, chunk: &str) -> String {
        let indent = if self.shown.is_empty() { "  " } else { "" };
        self.shown.push_str(chunk);
        format!("{indent}{chunk}")
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        !self.shown.is_empty()
    }

    /// Line to print for an assistant bubble, closing any open stream.
    pub fn finish(&mut self, message: &Message) -> String {
        if self.shown.is_empty() {
            return render_bubble(message);
        }
        let shown = std::mem::take(&mut self.shown);
        if shown.trim() == message.text {
            format!("\n  [{}]", speaker_label(message))
        } else {
            format!("\n{}", render_bubble(message))
        }
    }
}

/// Colour band for an intensity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityBand {
    Low,
    Moderate,
    Elevated,
    High,
}

impl IntensityBand {
    #[must_use]
    pub fn of(intensity: u8) -> Self {
        match intensity {
            8.. => Self::High,
            6..=7 => Self::Elevated,
            4..=5 => Self::Moderate,
            _ => Self::Low,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Elevated => "elevated",
            Self::High => "high",
        }
    }
}

/// Ten-cell bar, one filled cell per intensity point.
#[must_use]
pub fn intensity_bar(intensity: u8) -> String {
    let filled = usize::from(intensity.min(10));
    format!("{}{}", "#".repeat(filled), "-".repeat(10 - filled))
}

/// The "Emotional State" panel.
#[must_use]
pub fn emotion_panel(emotion: Option<&EmotionState>) -> String {
    let Some(emotion) = emotion else {
        return "Emotional State\n  Nothing detected yet.".to_owned();
    };
    let mut out = format!(
        "Emotional State\n  Sentiment: {}\n  Intensity: [{}] {}/10 ({})",
        emotion.sentiment,
        intensity_bar(emotion.intensity),
        emotion.intensity,
        IntensityBand::of(emotion.intensity).as_str()
    );
    if !emotion.emotions.is_empty() {
        let tags: Vec<&str> = emotion.emotions.iter().map(|e| e.as_str()).collect();
        out.push_str(&format!("\n  Detected: {}", tags.join(", ")));
    }
    out
}

/// Orb, voice and reflection status in one block.
#[must_use]
pub fn status_panel(
    state: ConversationState,
    voice_enabled: bool,
    reflection: Option<&ReflectionContext>,
) -> String {
    let mut out = format!(
        "Status: {}\n  Voice output: {}",
        orb_label(state),
        if voice_enabled { "on" } else { "off" }
    );
    if let Some(r) = reflection {
        out.push_str(&format!("\n  Reflecting on: {}", r.question));
    }
    out
}

/// The "Memory Bank" panel. `records` are expected newest first.
#[must_use]
pub fn memory_panel(records: &[MemoryRecord]) -> String {
    let mut out = String::from("Memory Bank");
    if records.is_empty() {
        out.push_str("\n  ");
        out.push_str(EMPTY_MEMORY_TEXT);
        return out;
    }
    for record in records {
        out.push_str(&format!(
            "\n  {}  [{}]  {}",
            format_time(record),
            record.emotion_summary(),
            preview(&record.user_input)
        ));
    }
    out
}

/// Expanded view of one memory.
#[must_use]
pub fn memory_detail(record: &MemoryRecord) -> String {
    let mut out = format!(
        "You said: {}\nI responded: {}\nWhen: {}",
        record.user_input,
        record.ai_response,
        format_time(record)
    );
    if let Some(emotion) = &record.emotion {
        out.push_str(&format!(
            "\nMood: {} ({}/10)",
            emotion.sentiment, emotion.intensity
        ));
    }
    out
}

fn format_time(record: &MemoryRecord) -> String {
    record
        .timestamp
        .with_timezone(&Local)
        .format("%b %-d, %-I:%M %p")
        .to_string()
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_owned();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}
