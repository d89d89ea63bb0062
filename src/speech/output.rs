//! Speech output: voice selection, prosody and the synthesizer wrapper.

use crate::config::VoiceConfig;
use crate::emotion::Sentiment;
use crate::error::{Result, SamanthaError};
use tracing::debug;

/// A voice offered by the host synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP-47 tag (`en-US`); some hosts report `en_US`.
    pub lang: String,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    fn speaks(&self, language: &str) -> bool {
        normalize_lang(&self.lang) == normalize_lang(language)
    }
}

fn normalize_lang(tag: &str) -> String {
    tag.replace('_', "-").to_ascii_lowercase()
}

/// Delivery parameters, each a multiplier around `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Prosody {
    /// Neutral delivery: a slightly raised pitch at normal rate and volume.
    pub const NEUTRAL: Self = Self {
        rate: 1.0,
        pitch: 1.1,
        volume: 1.0,
    };

    /// Late-night delivery: slower, lower, quieter.
    pub const NIGHT: Self = Self {
        rate: 0.8,
        pitch: 0.9,
        volume: 0.7,
    };

    /// Response to a negative mood.
    pub const GENTLE: Self = Self {
        rate: 0.9,
        pitch: 0.95,
        volume: 0.8,
    };

    /// Response to a positive mood.
    pub const BRIGHT: Self = Self {
        rate: 1.1,
        pitch: 1.05,
        volume: 0.9,
    };

    /// Delivery for a reply at local `hour` to a user in `mood`.
    ///
    /// Night hours win over mood.
    #[must_use]
    pub fn for_turn(mood: Option<Sentiment>, hour: u32, voice: &VoiceConfig) -> Self {
        if voice.is_night(hour) {
            return Self::NIGHT;
        }
        match mood {
            Some(Sentiment::Negative) => Self::GENTLE,
            Some(Sentiment::Positive) => Self::BRIGHT,
            Some(Sentiment::Neutral) | None => Self::NEUTRAL,
        }
    }
}

impl Default for Prosody {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Identifies one utterance handed to a synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(u64);

impl UtteranceId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Completion report from an output backend, tagged with the utterance it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    Finished(UtteranceId),
    Failed(UtteranceId, String),
}

impl SynthesisEvent {
    #[must_use]
    pub fn id(&self) -> UtteranceId {
        match self {
            Self::Finished(id) | Self::Failed(id, _) => *id,
        }
    }
}

/// One request to the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub voice: Option<Voice>,
    pub prosody: Prosody,
}

/// Host text-to-speech capability.
pub trait SpeechSynthesizer: Send {
    fn is_supported(&self) -> bool;

    /// Voices the host offers, in host order.
    fn voices(&self) -> Vec<Voice>;

    /// Start speaking. Completion is reported out of band by the backend as
    /// a [`SynthesisEvent`] carrying `utterance.id`.
    fn speak(&mut self, utterance: Utterance) -> Result<()>;

    /// Stop any in-flight utterance.
    fn cancel(&mut self);
}

/// Pick a voice: configured names first, then a female voice for the
/// language, then any voice for the language, then whatever comes first.
#[must_use]
pub fn select_voice(voices: &[Voice], preferred: &[String], language: &str) -> Option<Voice> {
    preferred
        .iter()
        .find_map(|name| voices.iter().find(|v| &v.name == name))
        .or_else(|| {
            voices
                .iter()
                .find(|v| v.speaks(language) && v.name.contains("Female"))
        })
        .or_else(|| voices.iter().find(|v| v.speaks(language)))
        .or_else(|| voices.first())
        .cloned()
}

/// Wraps a [`SpeechSynthesizer`], cancelling in-flight speech before each
/// new utterance.
///
/// Only the most recent utterance counts as current; completions for
/// anything older are rejected by [`SpeechOutput::complete`].
pub struct SpeechOutput {
    synth: Box<dyn SpeechSynthesizer>,
    preferred: Vec<String>,
    language: String,
    next_id: u64,
    current: Option<UtteranceId>,
}

impl SpeechOutput {
    #[must_use]
    pub fn new(synth: Box<dyn SpeechSynthesizer>, config: &VoiceConfig) -> Self {
        Self {
            synth,
            preferred: config.preferred_voices.clone(),
            language: config.language.clone(),
            next_id: 0,
            current: None,
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.synth.is_supported()
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    /// The utterance currently being spoken.
    #[must_use]
    pub fn current(&self) -> Option<UtteranceId> {
        self.current
    }

    /// # Errors
    ///
    /// [`SamanthaError::SynthesisUnavailable`] when the host cannot speak;
    /// otherwise whatever the backend reports.
    pub fn speak(&mut self, text: &str, prosody: Prosody) -> Result<UtteranceId> {
        if !self.synth.is_supported() {
            return Err(SamanthaError::SynthesisUnavailable(
                "speech synthesis is not supported on this host".into(),
            ));
        }
        self.cancel();

        let voice = select_voice(&self.synth.voices(), &self.preferred, &self.language);
        debug!(
            "speaking with {} (rate {}, pitch {}, volume {})",
            voice.as_ref().map_or("default voice", |v| v.name.as_str()),
            prosody.rate,
            prosody.pitch,
            prosody.volume
        );
        let id = UtteranceId(self.next_id);
        self.next_id += 1;
        self.synth.speak(Utterance {
            id,
            text: text.to_owned(),
            voice,
            prosody,
        })?;
        self.current = Some(id);
        Ok(id)
    }

    pub fn cancel(&mut self) {
        if self.current.take().is_some() {
            self.synth.cancel();
        }
    }

    /// Mark whatever is current complete.
    pub fn finished(&mut self) {
        self.current = None;
    }

    /// Accept a backend completion for `id`. Returns `false` when `id` is
    /// not the current utterance.
    pub fn complete(&mut self, id: UtteranceId) -> bool {
        self.current.take_if(|current| *current == id).is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::sync::{Arc, Mutex};

    fn voices() -> Vec<Voice> {
        vec![
            Voice::new("Thomas", "fr-FR"),
            Voice::new("Daniel", "en_US"),
            Voice::new("Microsoft Zira Female", "en-US"),
            Voice::new("Samantha", "en-US"),
        ]
    }

    #[test]
    fn configured_name_wins() {
        let preferred = vec!["Samantha".to_owned()];
        let v = select_voice(&voices(), &preferred, "en-US").unwrap();
        assert_eq!(v.name, "Samantha");
    }

    #[test]
    fn preference_order_is_respected() {
        let preferred = vec!["Missing".to_owned(), "Daniel".to_owned(), "Samantha".to_owned()];
        let v = select_voice(&voices(), &preferred, "en-US").unwrap();
        assert_eq!(v.name, "Daniel");
    }

    #[test]
    fn female_language_match_beats_plain_match() {
        let v = select_voice(&voices(), &[], "en-US").unwrap();
        assert_eq!(v.name, "Microsoft Zira Female");
    }

    #[test]
    fn language_match_accepts_underscore_tags() {
        let vs = vec![Voice::new("Thomas", "fr-FR"), Voice::new("Daniel", "en_US")];
        let v = select_voice(&vs, &[], "en-US").unwrap();
        assert_eq!(v.name, "Daniel");
    }

    #[test]
    fn falls_back_to_first_voice() {
        let vs = vec![Voice::new("Thomas", "fr-FR"), Voice::new("Anna", "de-DE")];
        let v = select_voice(&vs, &[], "en-US").unwrap();
        assert_eq!(v.name, "Thomas");
        assert!(select_voice(&[], &[], "en-US").is_none());
    }

    #[test]
    fn night_overrides_mood() {
        let cfg = VoiceConfig::default();
        assert_eq!(
            Prosody::for_turn(Some(Sentiment::Positive), 23, &cfg),
            Prosody::NIGHT
        );
        assert_eq!(
            Prosody::for_turn(Some(Sentiment::Negative), 3, &cfg),
            Prosody::NIGHT
        );
        assert_eq!(Prosody::for_turn(None, 6, &cfg), Prosody::NIGHT);
    }

    #[test]
    fn daytime_follows_mood() {
        let cfg = VoiceConfig::default();
        let p = Prosody::for_turn(Some(Sentiment::Negative), 14, &cfg);
        assert_eq!((p.rate, p.pitch, p.volume), (0.9, 0.95, 0.8));
        let p = Prosody::for_turn(Some(Sentiment::Positive), 14, &cfg);
        assert_eq!((p.rate, p.pitch, p.volume), (1.1, 1.05, 0.9));
        let p = Prosody::for_turn(Some(Sentiment::Neutral), 7, &cfg);
        assert_eq!((p.rate, p.pitch, p.volume), (1.0, 1.1, 1.0));
    }

    #[test]
    fn night_mode_can_be_disabled() {
        let cfg = VoiceConfig {
            night_mode: false,
            ..VoiceConfig::default()
        };
        assert_eq!(
            Prosody::for_turn(Some(Sentiment::Positive), 23, &cfg),
            Prosody::BRIGHT
        );
    }

    #[derive(Default)]
    struct Log {
        spoken: Vec<Utterance>,
        cancels: usize,
    }

    struct FakeSynth {
        supported: bool,
        log: Arc<Mutex<Log>>,
    }

    impl SpeechSynthesizer for FakeSynth {
        fn is_supported(&self) -> bool {
            self.supported
        }
        fn voices(&self) -> Vec<Voice> {
            voices()
        }
        fn speak(&mut self, utterance: Utterance) -> Result<()> {
            self.log.lock().unwrap().spoken.push(utterance);
            Ok(())
        }
        fn cancel(&mut self) {
            self.log.lock().unwrap().cancels += 1;
        }
    }

    fn output(supported: bool) -> (SpeechOutput, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let synth = FakeSynth {
            supported,
            log: Arc::clone(&log),
        };
        (
            SpeechOutput::new(Box::new(synth), &VoiceConfig::default()),
            log,
        )
    }

    #[test]
    fn speak_cancels_previous_utterance() {
        let (mut out, log) = output(true);
        out.speak("first", Prosody::NEUTRAL).unwrap();
        out.speak("second", Prosody::GENTLE).unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log.cancels, 1);
        assert_eq!(log.spoken.len(), 2);
        assert_eq!(log.spoken[1].text, "second");
        assert_eq!(log.spoken[1].prosody, Prosody::GENTLE);
        assert_eq!(log.spoken[1].voice.as_ref().unwrap().name, "Samantha");
    }

    #[test]
    fn finished_utterance_is_not_cancelled() {
        let (mut out, log) = output(true);
        out.speak("first", Prosody::NEUTRAL).unwrap();
        out.finished();
        assert!(!out.is_speaking());
        out.speak("second", Prosody::NEUTRAL).unwrap();
        assert_eq!(log.lock().unwrap().cancels, 0);
    }

    #[test]
    fn unsupported_host_is_reported() {
        let (mut out, log) = output(false);
        assert!(matches!(
            out.speak("hello", Prosody::NEUTRAL),
            Err(SamanthaError::SynthesisUnavailable(_))
        ));
        assert!(!out.is_speaking());
        assert!(log.lock().unwrap().spoken.is_empty());
    }

    #[test]
    fn completion_for_replaced_utterance_is_rejected() {
        let (mut out, log) = output(true);
        let first = out.speak("first", Prosody::NEUTRAL).unwrap();
        let second = out.speak("second", Prosody::NEUTRAL).unwrap();
        assert_ne!(first, second);
        assert_eq!(log.lock().unwrap().spoken[1].id, second);

        assert!(!out.complete(first));
        assert!(out.is_speaking());
        assert_eq!(out.current(), Some(second));

        assert!(out.complete(second));
        assert!(!out.is_speaking());
        assert!(!out.complete(second));
    }
}
