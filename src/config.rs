//! Configuration types for the voice companion.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamanthaConfig {
    /// Remote chat / emotion endpoint settings.
    pub chat: ChatConfig,
    /// Speech capture and output settings.
    pub voice: VoiceConfig,
    /// Memory log settings.
    pub memory: MemoryConfig,
    /// Turn-taking behaviour.
    pub conversation: ConversationConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Wire shape of the chat endpoint's reply.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// JSON reply carrying `response`, `emotion` and `type`.
    #[default]
    Structured,
    /// Raw text chunks streamed from the hosted model; emotion is tagged
    /// client-side.
    Stream,
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat route that proxies the hosted model.
    pub endpoint: String,
    /// Reply shape served by `endpoint`.
    pub mode: ChatMode,
    /// Remote emotion route. When unset the local keyword heuristic is used.
    pub emotion_endpoint: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/api/chat".to_owned(),
            mode: ChatMode::Structured,
            emotion_endpoint: None,
            timeout_secs: 30,
        }
    }
}

/// Speech capture / synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether replies are spoken aloud.
    pub enabled: bool,
    /// BCP-47 language tag used for recognition and voice matching.
    pub language: String,
    /// Voice names tried first, in order.
    pub preferred_voices: Vec<String>,
    /// External TTS command (`say`, `espeak-ng`, ...). `None` = autodetect.
    pub synth_command: Option<String>,
    /// Whether late-night hours soften the delivery.
    pub night_mode: bool,
    /// First hour (inclusive) considered night.
    pub night_start_hour: u32,
    /// Last hour (inclusive) considered night.
    pub night_end_hour: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en-US".to_owned(),
            preferred_voices: vec!["Samantha".to_owned(), "Google US English".to_owned()],
            synth_command: None,
            night_mode: true,
            night_start_hour: 22,
            night_end_hour: 6,
        }
    }
}

impl VoiceConfig {
    /// Whether `hour` falls in the configured night window (wraps midnight).
    #[must_use]
    pub fn is_night(&self, hour: u32) -> bool {
        if !self.night_mode {
            return false;
        }
        if self.night_start_hour <= self.night_end_hour {
            (self.night_start_hour..=self.night_end_hour).contains(&hour)
        } else {
            hour >= self.night_start_hour || hour <= self.night_end_hour
        }
    }
}

/// Memory log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// JSON file holding the log. `None` = `<data_dir>/memories.json`.
    pub path: Option<PathBuf>,
    /// Maximum number of records retained (oldest evicted first).
    pub capacity: usize,
    /// Number of records shown in the memory panel.
    pub panel_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            capacity: 100,
            panel_size: 10,
        }
    }
}

impl MemoryConfig {
    /// Resolved location of the memory log.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::samantha_dirs::memory_file)
    }
}

/// Turn-taking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Assistant message substituted when the remote call fails.
    pub fallback_message: String,
    /// Whether the fallback message is spoken as well as displayed.
    pub speak_fallback: bool,
    /// Whether a greeting opens each session.
    pub greet_on_start: bool,
}

/// Apology shown when the chat endpoint cannot be reached.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I'm having some trouble connecting to my thoughts. Please try again.";

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_owned(),
            speak_fallback: true,
            greet_on_start: true,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write a daily rolling log under `<data_dir>/logs`.
    pub file: bool,
    /// Default filter directive when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl SamanthaConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::SamanthaError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SamanthaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config_dir>/samantha/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::samantha_dirs::config_file()
    }

    /// Load from `path` when given, else from the default path when it
    /// exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> crate::error::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
