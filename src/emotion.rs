//! Keyword heuristic for the user's emotional state.
//!
//! Maps free text to a coarse [`Sentiment`], the set of [`EmotionTag`]s
//! whose keywords appear in it, and an intensity score in `1..=10`.
//!
//! The classifier is a pure, deterministic table lookup: lower-case the
//! text, count literal substring hits per table, then derive sentiment and
//! intensity from the counts. It sits behind the [`EmotionDetector`] trait
//! so a remote or model-backed detector can replace it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Coarse polarity of a piece of text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Bubble emotion used when the reply carries no explicit tag.
    #[must_use]
    pub fn display_emotion(self) -> DisplayEmotion {
        match self {
            Self::Positive => DisplayEmotion::Happy,
            Self::Negative => DisplayEmotion::Sad,
            Self::Neutral => DisplayEmotion::Neutral,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotion vocabulary recognised by the keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionTag {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Love,
    Hope,
    Loneliness,
    Stress,
}

impl EmotionTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Disgust => "disgust",
            Self::Love => "love",
            Self::Hope => "hope",
            Self::Loneliness => "loneliness",
            Self::Stress => "stress",
        }
    }

    /// Tags that pull sentiment towards positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Joy | Self::Love | Self::Hope)
    }

    /// Tags that pull sentiment towards negative.
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            Self::Sadness
                | Self::Anger
                | Self::Fear
                | Self::Disgust
                | Self::Loneliness
                | Self::Stress
        )
    }
}

impl std::fmt::Display for EmotionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotion attached to a chat bubble (the chat endpoint's small tag set).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayEmotion {
    Happy,
    Sad,
    Angry,
    Curious,
    #[default]
    Neutral,
    Excited,
}

impl DisplayEmotion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Curious => "curious",
            Self::Neutral => "neutral",
            Self::Excited => "excited",
        }
    }

    /// Parse a tag from the wire; unknown tags yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Some(Self::Happy),
            "sad" => Some(Self::Sad),
            "angry" => Some(Self::Angry),
            "curious" => Some(Self::Curious),
            "neutral" => Some(Self::Neutral),
            "excited" => Some(Self::Excited),
            _ => None,
        }
    }
}

/// Result of emotion analysis for one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionState {
    pub sentiment: Sentiment,
    /// Detected tags, in table order.
    pub emotions: Vec<EmotionTag>,
    /// Strength of the detected emotion, `1..=10`.
    pub intensity: u8,
}

impl Default for EmotionState {
    fn default() -> Self {
        Self::neutral()
    }
}

impl EmotionState {
    /// The state reported for empty input or a failed remote lookup.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            emotions: Vec::new(),
            intensity: NEUTRAL_INTENSITY,
        }
    }

    /// Short label such as `positive (6/10)`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} ({}/10)", self.sentiment, self.intensity)
    }

    /// One-line description sent to the chat backend alongside the message.
    #[must_use]
    pub fn context_line(&self) -> String {
        let tags: Vec<&str> = self.emotions.iter().map(|e| e.as_str()).collect();
        format!(
            "User seems {} with emotions: {}. Intensity: {}/10",
            self.sentiment,
            tags.join(", "),
            self.intensity
        )
    }
}

/// Intensity reported when nothing matched.
pub const NEUTRAL_INTENSITY: u8 = 5;

// ── Keyword tables ──────────────────────────────────────────────────────

const EMOTION_TABLE: &[(EmotionTag, &[&str])] = &[
    (
        EmotionTag::Joy,
        &[
            "happy",
            "excited",
            "thrilled",
            "delighted",
            "cheerful",
            "elated",
            "joyful",
            "glad",
            "pleased",
        ],
    ),
    (
        EmotionTag::Sadness,
        &[
            "sad",
            "depressed",
            "down",
            "upset",
            "disappointed",
            "heartbroken",
            "miserable",
            "gloomy",
        ],
    ),
    (
        EmotionTag::Anger,
        &[
            "angry",
            "furious",
            "mad",
            "irritated",
            "annoyed",
            "frustrated",
            "outraged",
            "livid",
        ],
    ),
    (
        EmotionTag::Fear,
        &[
            "scared",
            "afraid",
            "terrified",
            "anxious",
            "worried",
            "nervous",
            "frightened",
            "panicked",
        ],
    ),
    (
        EmotionTag::Surprise,
        &[
            "surprised",
            "shocked",
            "amazed",
            "astonished",
            "stunned",
            "bewildered",
        ],
    ),
    (
        EmotionTag::Disgust,
        &["disgusted", "revolted", "repulsed", "sickened", "appalled"],
    ),
    (
        EmotionTag::Love,
        &["love", "adore", "cherish", "treasure", "devoted", "affectionate"],
    ),
    (
        EmotionTag::Hope,
        &["hopeful", "optimistic", "confident", "positive", "encouraged"],
    ),
    (
        EmotionTag::Loneliness,
        &["lonely", "isolated", "alone", "abandoned", "disconnected"],
    ),
    (
        EmotionTag::Stress,
        &["stressed", "overwhelmed", "pressured", "tense", "strained"],
    ),
];

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "awesome",
    "wonderful",
    "amazing",
    "fantastic",
    "excellent",
    "perfect",
    "beautiful",
    "lovely",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "horrible",
    "disgusting",
    "hate",
    "worst",
    "stupid",
    "annoying",
    "frustrating",
];

/// Analyse `text` and return its emotional state.
///
/// Empty input yields [`EmotionState::neutral`].
pub fn analyze(text: &str) -> EmotionState {
    if text.is_empty() {
        return EmotionState::neutral();
    }

    let lower = text.to_lowercase();
    let token_count = segment_count(&lower);

    let mut emotions = Vec::new();
    let mut emotion_score = 0usize;
    for &(tag, keywords) in EMOTION_TABLE {
        let hits = count_hits(&lower, keywords);
        if hits > 0 {
            emotions.push(tag);
            emotion_score += hits;
        }
    }

    let positive = count_hits(&lower, POSITIVE_WORDS);
    let negative = count_hits(&lower, NEGATIVE_WORDS);

    let mut sentiment = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    };

    let total = (positive + negative + emotion_score) as f64;
    let raw = (total / token_count as f64 * 50.0 + 5.0).round();
    let intensity = raw.clamp(1.0, 10.0) as u8;

    let has_positive = emotions.iter().any(|e| e.is_positive());
    let has_negative = emotions.iter().any(|e| e.is_negative());
    if has_positive && !has_negative {
        sentiment = Sentiment::Positive;
    } else if has_negative && !has_positive {
        sentiment = Sentiment::Negative;
    }

    EmotionState {
        sentiment,
        emotions,
        intensity,
    }
}

// ── Detector seam ───────────────────────────────────────────────────────

/// Text → [`EmotionState`] capability used by the conversation loop.
#[async_trait]
pub trait EmotionDetector: Send + Sync {
    /// Classify `text`. Implementations never fail; they degrade to
    /// [`EmotionState::neutral`].
    async fn detect(&self, text: &str) -> EmotionState;
}

/// The local keyword heuristic.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordEmotionDetector;

#[async_trait]
impl EmotionDetector for KeywordEmotionDetector {
    async fn detect(&self, text: &str) -> EmotionState {
        analyze(text)
    }
}

// ── Internals ───────────────────────────────────────────────────────────

fn count_hits(haystack: &str, needles: &[&str]) -> usize {
    needles.iter().filter(|n| haystack.contains(*n)).count()
}

/// Number of segments produced by splitting on whitespace runs. Leading or
/// trailing runs contribute an empty segment each, so the result is never 0.
fn segment_count(text: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                runs += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
    runs + 1
}

// ── Tests ───────────────────────────────────────────────────────────────
