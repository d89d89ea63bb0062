//! Centralized application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/samantha/` | `~/.local/share/samantha/` |
//! | Config | `~/Library/Application Support/samantha/` | `~/.config/samantha/` |
//!
//! # Environment Overrides
//!
//! - `SAMANTHA_DATA_DIR`: overrides [`data_dir`]
//! - `SAMANTHA_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the memory log and log files. Resolves to
/// `dirs::data_dir()/samantha/` unless `SAMANTHA_DATA_DIR` is set.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SAMANTHA_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("samantha"))
        .unwrap_or_else(|| PathBuf::from("/tmp/samantha-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/samantha/` unless `SAMANTHA_CONFIG_DIR`
/// is set.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SAMANTHA_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("samantha"))
        .unwrap_or_else(|| PathBuf::from("/tmp/samantha-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Memory log file (`data_dir()/memories.json`).
#[must_use]
pub fn memory_file() -> PathBuf {
    data_dir().join("memories.json")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_their_roots() {
        assert!(logs_dir().starts_with(data_dir()));
        assert!(memory_file().starts_with(data_dir()));
        assert!(config_file().starts_with(config_dir()));
    }

    #[test]
    fn file_names_are_stable() {
        assert!(memory_file().ends_with("memories.json"));
        assert!(config_file().ends_with("config.toml"));
        assert!(logs_dir().ends_with("logs"));
    }
}
