//! File-backed history persistence.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "history": {
//!     "aria@42": { ... HistoryRecord fields ... }
//!   }
//! }
//! ```
//!
//! # Loading
//!
//! Loading is fail-closed: the store comes back either fully populated or empty.
//! - Missing file, empty file: empty store
//! - Corrupt JSON, unsupported version: empty store, logged at warn
//! - Missing record fields: serde defaults
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a crash mid-save never leaves a truncated file.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use super::store::HistoryStore;
use super::types::HistoryRecord;
use crate::error::{Result, SightlineError};
use crate::key::EntryKey;

pub const HISTORY_FILE_VERSION: u32 = 1;

/// Loads and saves the durable history table.
///
/// Saves are synchronous and may fail; the tracker keeps its dirty flag and
/// retries on the next debounce window.
pub trait HistoryPersistence {
    fn load(&mut self) -> Result<HistoryStore>;
    fn save(&mut self, history: &HistoryStore) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    #[serde(default)]
    history: HashMap<EntryKey, HistoryRecord>,
}

/// History stored as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    file_path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(file_path: &Path) -> Self {
        JsonFilePersistence {
            file_path: file_path.to_path_buf(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl HistoryPersistence for JsonFilePersistence {
    fn load(&mut self) -> Result<HistoryStore> {
        if !self.file_path.exists() {
            return Ok(HistoryStore::new());
        }

        let content = fs::read_to_string(&self.file_path)
            .map_err(|e| SightlineError::io("Failed to read history file", e))?;

        if content.trim().is_empty() {
            warn!(path = %self.file_path.display(), "Empty history file, starting with empty history");
            return Ok(HistoryStore::new());
        }

        match serde_json::from_str::<HistoryFile>(&content) {
            Ok(file) if file.version == HISTORY_FILE_VERSION => {
                // Re-key through EntryKey::parse so hand-edited files stay case-insensitive.
                let records = file
                    .history
                    .into_iter()
                    .map(|(key, record)| (EntryKey::parse(key.as_str()), record))
                    .collect();
                Ok(HistoryStore::from_records(records))
            }
            Ok(file) => {
                warn!(
                    version = file.version,
                    expected = HISTORY_FILE_VERSION,
                    "Unsupported history file version, starting with empty history"
                );
                Ok(HistoryStore::new())
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse history file, starting with empty history");
                Ok(HistoryStore::new())
            }
        }
    }

    fn save(&mut self, history: &HistoryStore) -> Result<()> {
        let file = HistoryFile {
            version: HISTORY_FILE_VERSION,
            history: history.records().clone(),
        };

        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| SightlineError::json("Failed to serialize history", e))?;

        let parent_dir = self
            .file_path
            .parent()
            .ok_or_else(|| SightlineError::NoParentDir(self.file_path.clone()))?;
        fs::create_dir_all(parent_dir)
            .map_err(|e| SightlineError::io("Failed to create history directory", e))?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|e| SightlineError::io("Temp file error", e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| SightlineError::io("Failed to write temp history file", e))?;
        temp_file
            .flush()
            .map_err(|e| SightlineError::io("Failed to flush temp history file", e))?;
        temp_file
            .persist(&self.file_path)
            .map_err(|e| SightlineError::io("Failed to write history file", e.error))?;

        Ok(())
    }
}

/// Keeps the last saved snapshot in memory. Used by tests and embedders that
/// persist history elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    saved: Option<HistoryStore>,
    save_count: usize,
    fail_saves: bool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        MemoryPersistence::default()
    }

    pub fn with_history(history: HistoryStore) -> Self {
        MemoryPersistence {
            saved: Some(history),
            ..Default::default()
        }
    }

    /// Makes every following save fail until turned off again.
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn saved(&self) -> Option<&HistoryStore> {
        self.saved.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl HistoryPersistence for MemoryPersistence {
    fn load(&mut self) -> Result<HistoryStore> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, history: &HistoryStore) -> Result<()> {
        if self.fail_saves {
            return Err(SightlineError::PersistenceUnavailable(
                "in-memory saves disabled".to_string(),
            ));
        }
        self.saved = Some(history.clone());
        self.save_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRecord;
    use chrono::Utc;
    use tempfile::tempdir;

    fn history_with(name: &str) -> HistoryStore {
        let now = Utc::now();
        let session = SessionRecord {
            name: name.to_string(),
            home_location_id: 7,
            home_location_name: "Gaia".to_string(),
            current_location_name: None,
            first_seen_at: now,
            last_seen_at: now,
            seen_count: 1,
            is_visible: true,
        };
        let mut store = HistoryStore::new();
        store.record_sighting(&session.key(), &session, now, true);
        store
    }

    #[test]
    fn test_persistence_round_trip() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("history.json");

        let mut persistence = JsonFilePersistence::new(&file);
        let history = history_with("Aria");
        persistence.save(&history).unwrap();

        let loaded = JsonFilePersistence::new(&file).load().unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_save_creates_missing_parent_dir() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("nested").join("history.json");
        JsonFilePersistence::new(&file)
            .save(&history_with("Aria"))
            .unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_load_nonexistent_file_returns_empty_store() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("nonexistent.json");
        let store = JsonFilePersistence::new(&file).load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_empty_file_returns_empty_store() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("empty.json");
        fs::write(&file, "").unwrap();
        assert!(JsonFilePersistence::new(&file).load().unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_json_returns_empty_store() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("corrupt.json");
        fs::write(&file, r#"{"version":1,"history":{"aria@7":{"name":"#).unwrap();
        assert!(JsonFilePersistence::new(&file).load().unwrap().is_empty());
    }

    #[test]
    fn test_load_unsupported_version_returns_empty_store() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("v9.json");
        fs::write(&file, r#"{"version":9,"history":{}}"#).unwrap();
        assert!(JsonFilePersistence::new(&file).load().unwrap().is_empty());
    }

    #[test]
    fn test_load_normalizes_hand_edited_keys() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("history.json");
        fs::write(
            &file,
            r#"{"version":1,"history":{"ARIA@7":{
                "name":"Aria","home_location_id":7,"home_location_name":"Gaia",
                "first_seen_at":"2026-01-01T00:00:00Z","last_seen_at":"2026-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();
        let store = JsonFilePersistence::new(&file).load().unwrap();
        assert!(store.contains("aria@7"));
    }

    #[test]
    fn test_memory_persistence_failure_toggle() {
        let mut persistence = MemoryPersistence::new();
        persistence.set_fail_saves(true);
        assert!(persistence.save(&history_with("Aria")).is_err());
        assert_eq!(persistence.save_count(), 0);

        persistence.set_fail_saves(false);
        persistence.save(&history_with("Aria")).unwrap();
        assert_eq!(persistence.save_count(), 1);
        assert!(persistence.saved().unwrap().contains("aria@7"));
    }
}
