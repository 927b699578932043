//! Sightline configuration and its persistence.
//!
//! Loading never fails: a missing or unreadable file yields defaults. Retention
//! is clamped to `MIN_AUTO_PRUNE_DAYS..=MAX_AUTO_PRUNE_DAYS` wherever it is
//! read or written.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SightlineError};
use crate::storage::StorageConfig;

pub const DEFAULT_AUTO_PRUNE_DAYS: i64 = 30;
pub const MIN_AUTO_PRUNE_DAYS: i64 = 1;
pub const MAX_AUTO_PRUNE_DAYS: i64 = 36_500;

pub const DEFAULT_EXPORT_TEMPLATE: &str = "Sightings ({{timestamp_utc}})\n\
World: {{world}}\n\
Location: {{location}}\n\
\n\
{{names}}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub auto_prune_days: i64,
    pub include_exported_by_default: bool,
    pub mark_exported_after_copy: bool,
    pub include_world_in_names: bool,
    /// Forwarded to the sighting source on every tick.
    pub filter_blocked: bool,
    pub export_template: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            auto_prune_days: DEFAULT_AUTO_PRUNE_DAYS,
            include_exported_by_default: false,
            mark_exported_after_copy: true,
            include_world_in_names: false,
            filter_blocked: true,
            export_template: DEFAULT_EXPORT_TEMPLATE.to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn retention_days(&self) -> i64 {
        self.auto_prune_days.clamp(MIN_AUTO_PRUNE_DAYS, MAX_AUTO_PRUNE_DAYS)
    }

    pub fn set_retention_days(&mut self, days: i64) {
        self.auto_prune_days = days.clamp(MIN_AUTO_PRUNE_DAYS, MAX_AUTO_PRUNE_DAYS);
    }

    /// Returns a copy with every field inside its valid range.
    pub fn normalized(mut self) -> Self {
        self.auto_prune_days = self.retention_days();
        self
    }

    /// Whether switching to `other` changes which history keys are selected
    /// by default or how exports are finalized.
    pub(crate) fn export_flags_differ(&self, other: &TrackerConfig) -> bool {
        self.include_exported_by_default != other.include_exported_by_default
            || self.include_world_in_names != other.include_world_in_names
            || self.mark_exported_after_copy != other.mark_exported_after_copy
    }
}

/// Loads the configuration, returning defaults if the file is missing or corrupt.
pub fn load_config(storage: &StorageConfig) -> TrackerConfig {
    let path = storage.config_file();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return TrackerConfig::default(),
    };

    match serde_json::from_str::<TrackerConfig>(&content) {
        Ok(config) => config.normalized(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to parse config, using defaults");
            TrackerConfig::default()
        }
    }
}

/// Saves the configuration to disk.
pub fn save_config(storage: &StorageConfig, config: &TrackerConfig) -> Result<()> {
    let path = storage.config_file();
    storage.ensure_root()?;
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| SightlineError::json("Failed to serialize config", e))?;
    fs::write(&path, content).map_err(|source| SightlineError::ConfigWriteFailed { path, source })
}
