//! Speech capture and output behind swappable host backends.

pub mod capture;
pub mod output;
pub mod terminal;

pub use capture::{RecognitionEvent, SpeechCapture, SpeechRecognizer};
pub use output::{
    Prosody, SpeechOutput, SpeechSynthesizer, SynthesisEvent, Utterance, UtteranceId, Voice,
    select_voice,
};
pub use terminal::{CommandSynthesizer, PrintSynthesizer, TypedRecognizer};
