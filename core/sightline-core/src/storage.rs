//! Storage paths for Sightline data.
//!
//! Production code uses `StorageConfig::from_home()` which points to
//! `~/.sightline/`. Tests use `StorageConfig::with_root(temp_dir)` for isolation.

use fs_err as fs;
use std::path::{Path, PathBuf};

use crate::error::{SightlineError, Result};
use crate::history::JsonFilePersistence;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all Sightline data (default: ~/.sightline)
    root: PathBuf,
}

impl StorageConfig {
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(SightlineError::DataDirNotFound)?;
        Ok(Self {
            root: home.join(".sightline"),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to config.json (retention, export flags, template).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to history.json (durable sighting history).
    pub fn history_file(&self) -> PathBuf {
        self.root.join("history.json")
    }

    /// Path to logs/ directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn history_persistence(&self) -> JsonFilePersistence {
        JsonFilePersistence::new(&self.history_file())
    }

    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| SightlineError::io("Failed to create data directory", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_live_under_root() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/fn"));
        assert_eq!(storage.config_file(), PathBuf::from("/tmp/fn/config.json"));
        assert_eq!(storage.history_file(), PathBuf::from("/tmp/fn/history.json"));
        assert_eq!(storage.logs_dir(), PathBuf::from("/tmp/fn/logs"));
    }

    #[test]
    fn test_ensure_root_creates_directory() {
        let temp = tempdir().unwrap();
        let storage = StorageConfig::with_root(temp.path().join("a").join("b"));
        storage.ensure_root().unwrap();
        assert!(storage.root().is_dir());
    }
}
