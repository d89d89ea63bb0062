//! Terminal backends for capture and output.
//!
//! - [`TypedRecognizer`]: each line typed on stdin stands in for one
//!   finalized utterance. The CLI owns stdin; the recognizer only tracks
//!   whether a line is currently wanted.
//! - [`CommandSynthesizer`]: speaks through a platform TTS command
//!   (`say` on macOS, `espeak-ng`/`espeak` elsewhere) and reports
//!   completion on a channel.
//! - [`PrintSynthesizer`]: fallback when no TTS command exists; prints a
//!   delivery cue and completes immediately.

use super::capture::SpeechRecognizer;
use super::output::{Prosody, SpeechSynthesizer, SynthesisEvent, Utterance, Voice};
use crate::error::{Result, SamanthaError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// ── Capture ─────────────────────────────────────────────────────────────

/// Typed-line recognizer.
#[derive(Debug, Clone, Default)]
pub struct TypedRecognizer {
    active: Arc<AtomicBool>,
}

impl TypedRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared flag that is `true` while a capture session is open.
    #[must_use]
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }
}

impl SpeechRecognizer for TypedRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

// ── Output ──────────────────────────────────────────────────────────────

/// Words per minute both `say` and `espeak-ng` use at rate 1.0.
const BASE_WPM: f32 = 175.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Say,
    Espeak,
}

impl Flavor {
    fn of(program: &Path) -> Self {
        let name = program
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name == "say" { Self::Say } else { Self::Espeak }
    }
}

/// Speaks through an external TTS command.
pub struct CommandSynthesizer {
    program: PathBuf,
    flavor: Flavor,
    voices: Vec<Voice>,
    done_tx: mpsc::UnboundedSender<SynthesisEvent>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl CommandSynthesizer {
    /// Find a TTS command: `configured` if given, else the first of `say`,
    /// `espeak-ng`, `espeak` on `PATH`.
    #[must_use]
    pub fn detect(
        configured: Option<&str>,
        done_tx: mpsc::UnboundedSender<SynthesisEvent>,
    ) -> Option<Self> {
        let program = match configured {
            Some(cmd) => which::which(cmd).ok(),
            None => ["say", "espeak-ng", "espeak"]
                .iter()
                .find_map(|cmd| which::which(cmd).ok()),
        }?;
        info!("speech output via {}", program.display());
        Some(Self::new(program, done_tx))
    }

    #[must_use]
    pub fn new(program: PathBuf, done_tx: mpsc::UnboundedSender<SynthesisEvent>) -> Self {
        let flavor = Flavor::of(&program);
        let voices = if flavor == Flavor::Say {
            list_say_voices(&program)
        } else {
            Vec::new()
        };
        Self {
            program,
            flavor,
            voices,
            done_tx,
            stop_tx: None,
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn args(&self, utterance: &Utterance) -> Vec<String> {
        let Prosody {
            rate,
            pitch,
            volume,
        } = utterance.prosody;
        let wpm = (BASE_WPM * rate).round() as u32;
        let mut args = Vec::new();
        match self.flavor {
            Flavor::Say => {
                args.push("-r".to_owned());
                args.push(wpm.to_string());
                if let Some(voice) = &utterance.voice {
                    args.push("-v".to_owned());
                    args.push(voice.name.clone());
                }
                // `say` has no pitch flag; volume goes in as an embedded command.
                args.push(format!("[[volm {volume:.2}]] {}", utterance.text));
            }
            Flavor::Espeak => {
                args.push("-s".to_owned());
                args.push(wpm.to_string());
                args.push("-p".to_owned());
                args.push(((50.0 * pitch).round() as u32).min(99).to_string());
                args.push("-a".to_owned());
                args.push(((100.0 * volume).round() as u32).min(200).to_string());
                args.push(utterance.text.clone());
            }
        }
        args
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        self.cancel();

        let mut child = tokio::process::Command::new(&self.program)
            .args(self.args(&utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SamanthaError::Synthesis(format!(
                    "failed to run {}: {e}",
                    self.program.display()
                ))
            })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        let done_tx = self.done_tx.clone();
        let id = utterance.id;

        tokio::spawn(async move {
            let outcome = tokio::select! {
                status = child.wait() => Some(status),
                _ = stop_rx => None,
            };
            let event = match outcome {
                None => {
                    let _ = child.kill().await;
                    debug!("utterance {id:?} cancelled");
                    return;
                }
                Some(Ok(status)) if status.success() => SynthesisEvent::Finished(id),
                Some(Ok(status)) => {
                    SynthesisEvent::Failed(id, format!("tts exited with {status}"))
                }
                Some(Err(e)) => SynthesisEvent::Failed(id, format!("tts wait failed: {e}")),
            };
            let _ = done_tx.send(event);
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
    }
}

/// Parse `say -v ?` output: `Samantha   en_US    # Hello! My name is Samantha.`
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let spec = line.split('#').next()?.trim();
            let (name, lang) = spec.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Voice::new(name, lang.trim()))
        })
        .collect()
}

fn list_say_voices(program: &Path) -> Vec<Voice> {
    match std::process::Command::new(program).args(["-v", "?"]).output() {
        Ok(out) if out.status.success() => {
            let voices = parse_say_voices(&String::from_utf8_lossy(&out.stdout));
            debug!("{} voices available", voices.len());
            voices
        }
        Ok(out) => {
            warn!("voice listing failed: {}", out.status);
            Vec::new()
        }
        Err(e) => {
            warn!("voice listing failed: {e}");
            Vec::new()
        }
    }
}

/// Prints a delivery cue instead of speaking.
pub struct PrintSynthesizer {
    done_tx: mpsc::UnboundedSender<SynthesisEvent>,
}

impl PrintSynthesizer {
    #[must_use]
    pub fn new(done_tx: mpsc::UnboundedSender<SynthesisEvent>) -> Self {
        Self { done_tx }
    }
}

impl SpeechSynthesizer for PrintSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        println!("  ({})", delivery_cue(utterance.prosody));
        let _ = self.done_tx.send(SynthesisEvent::Finished(utterance.id));
        Ok(())
    }

    fn cancel(&mut self) {}
}

fn delivery_cue(prosody: Prosody) -> &'static str {
    if prosody == Prosody::NIGHT {
        "softly, slowly"
    } else if prosody == Prosody::GENTLE {
        "gently"
    } else if prosody == Prosody::BRIGHT {
        "brightly"
    } else {
        "warmly"
    }
}
