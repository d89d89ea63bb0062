//! Rolling memory log of completed turns.
//!
//! Records are kept as a single JSON array in `<data_dir>/memories.json`
//! (the same shape the browser front end kept under its
//! `samantha-memories` local-storage key). Every append rewrites the
//! file, evicting the oldest records beyond the configured capacity.

use crate::config::MemoryConfig;
use crate::emotion::EmotionState;
use crate::error::{Result, SamanthaError};
use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default maximum number of retained records.
pub const DEFAULT_CAPACITY: usize = 100;

/// When a turn happened, in the user's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    /// Hour of day, `0..=23`.
    pub time_of_day: u32,
    /// Day of week, `0` = Sunday.
    pub day_of_week: u32,
}

/// One persisted turn summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    pub timestamp: DateTime<Utc>,
    pub user_input: String,
    pub ai_response: String,
    pub emotion: Option<EmotionState>,
    pub context: TurnContext,
}

impl MemoryRecord {
    /// Build a record for a turn that completed at `now`.
    #[must_use]
    pub fn capture(
        user_input: impl Into<String>,
        ai_response: impl Into<String>,
        emotion: Option<EmotionState>,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            timestamp: now.with_timezone(&Utc),
            user_input: user_input.into(),
            ai_response: ai_response.into(),
            emotion,
            context: TurnContext {
                time_of_day: now.hour(),
                day_of_week: now.weekday().num_days_from_sunday(),
            },
        }
    }

    /// `sentiment (n/10)`, or `neutral` when no emotion was captured.
    #[must_use]
    pub fn emotion_summary(&self) -> String {
        self.emotion
            .as_ref()
            .map_or_else(|| "neutral".to_owned(), EmotionState::summary)
    }
}

/// Append-only, capacity-bounded log persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
    capacity: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
        }
    }

    #[must_use]
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.resolved_path(), config.capacity)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All records, oldest first. A missing file is an empty log.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Vec<MemoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let body = std::fs::read_to_string(&self.path)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| {
            SamanthaError::Memory(format!(
                "invalid memory log {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Append `record`, evicting the oldest entries beyond capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing log is unreadable or the write fails.
    pub fn append(&self, record: MemoryRecord) -> Result<()> {
        let mut records = self.load()?;
        records.push(record);
        if records.len() > self.capacity {
            let excess = records.len() - self.capacity;
            records.drain(..excess);
            debug!("evicted {excess} oldest memory records");
        }
        self.save(&records)
    }

    /// The last `n` records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or parsed.
    pub fn recent(&self, n: usize) -> Result<Vec<MemoryRecord>> {
        let records = self.load()?;
        Ok(records.into_iter().rev().take(n).collect())
    }

    /// # Errors
    ///
    /// Returns an error if the log cannot be read or parsed.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.load()?.is_empty())
    }

    fn save(&self, records: &[MemoryRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(records)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::emotion::analyze;
    use chrono::TimeZone;

    fn store_in(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::new(dir.path().join("memories.json"), DEFAULT_CAPACITY)
    }

    fn record(n: usize) -> MemoryRecord {
        MemoryRecord::capture(format!("input {n}"), format!("reply {n}"), None, Local::now())
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn append_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(record(1)).unwrap();
        store.append(record(2)).unwrap();
        let all = store.load().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].user_input, "input 1");
        assert_eq!(all[1].user_input, "input 2");
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for n in 1..=105 {
            store.append(record(n)).unwrap();
        }
        let all = store.load().unwrap();
        assert_eq!(all.len(), 100);
        assert_eq!(all[0].user_input, "input 6");
        assert_eq!(all[99].user_input, "input 105");
        for pair in all.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn recent_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for n in 1..=12 {
            store.append(record(n)).unwrap();
        }
        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].user_input, "input 12");
        assert_eq!(recent[9].user_input, "input 3");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "[{not json").unwrap();
        assert!(matches!(store.load(), Err(SamanthaError::Memory(_))));
        assert!(store.append(record(1)).is_err());
    }

    #[test]
    fn capture_derives_local_context() {
        // 2024-03-10 was a Sunday.
        let now = Local.with_ymd_and_hms(2024, 3, 10, 21, 15, 0).unwrap();
        let rec = MemoryRecord::capture("hi", "hello", Some(analyze("I'm happy")), now);
        assert_eq!(rec.context.time_of_day, 21);
        assert_eq!(rec.context.day_of_week, 0);
        assert_eq!(rec.timestamp, now.with_timezone(&Utc));
        assert_eq!(rec.emotion_summary(), "positive (10/10)");
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let rec = record(7);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["userInput"], "input 7");
        assert_eq!(json["aiResponse"], "reply 7");
        assert!(json["emotion"].is_null());
        assert!(json["context"]["timeOfDay"].is_u64());
        assert!(json["context"]["dayOfWeek"].is_u64());
    }

    #[test]
    fn missing_emotion_summarises_as_neutral() {
        assert_eq!(record(1).emotion_summary(), "neutral");
    }
}
