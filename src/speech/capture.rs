//! Speech capture: single-utterance, final-results-only recognition.

use crate::error::{Result, SamanthaError};
use tracing::{debug, warn};

/// Host speech-to-text capability.
pub trait SpeechRecognizer: Send {
    /// Whether the host can recognise speech at all.
    fn is_supported(&self) -> bool;

    /// Begin listening for one utterance.
    fn start(&mut self) -> Result<()>;

    /// Stop listening; any pending result may still be delivered.
    fn stop(&mut self);
}

/// Callback from the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A recognition result; interim results have `is_final == false`.
    Result { transcript: String, is_final: bool },
    /// Recognition failed.
    Error(String),
    /// The recognizer stopped on its own (end of utterance or silence).
    End,
}

/// Wraps a [`SpeechRecognizer`] and tracks the listening flag and the last
/// finalized transcript.
pub struct SpeechCapture {
    recognizer: Box<dyn SpeechRecognizer>,
    listening: bool,
    transcript: Option<String>,
}

impl SpeechCapture {
    #[must_use]
    pub fn new(recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            listening: false,
            transcript: None,
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    #[must_use]
    pub fn last_transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Start a capture session. A no-op while already listening.
    ///
    /// # Errors
    ///
    /// [`SamanthaError::CaptureUnavailable`] when the host has no recognizer;
    /// otherwise whatever the recognizer reports on start.
    pub fn start(&mut self) -> Result<()> {
        if !self.recognizer.is_supported() {
            return Err(SamanthaError::CaptureUnavailable(
                "speech recognition is not supported on this host".into(),
            ));
        }
        if self.listening {
            return Ok(());
        }
        self.transcript = None;
        match self.recognizer.start() {
            Ok(()) => {
                self.listening = true;
                debug!("capture started");
                Ok(())
            }
            Err(e) => {
                self.listening = false;
                warn!("could not start recognition: {e}");
                Err(e)
            }
        }
    }

    pub fn stop(&mut self) {
        if self.listening {
            self.recognizer.stop();
            self.listening = false;
            debug!("capture stopped");
        }
    }

    /// Feed a recognizer callback. Returns the transcript when a final
    /// result arrives.
    pub fn handle(&mut self, event: RecognitionEvent) -> Option<String> {
        match event {
            RecognitionEvent::Result {
                transcript,
                is_final: true,
            } => {
                self.transcript = Some(transcript.clone());
                Some(transcript)
            }
            RecognitionEvent::Result { .. } => None,
            RecognitionEvent::Error(e) => {
                warn!("speech recognition error: {e}");
                self.listening = false;
                None
            }
            RecognitionEvent::End => {
                self.listening = false;
                None
            }
        }
    }
}
