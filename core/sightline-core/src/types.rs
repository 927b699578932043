//! Core types shared between the tracker and its embedders.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::key::EntryKey;

// ═══════════════════════════════════════════════════════════════════════════════
// Sightings
// ═══════════════════════════════════════════════════════════════════════════════

/// One entity reported visible by the snapshot source during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    pub name: String,
    pub home_location_id: u32,
    pub home_location_name: String,
    #[serde(default)]
    pub current_location_name: Option<String>,
}

impl Sighting {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(&self.name, self.home_location_id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Scan State
// ═══════════════════════════════════════════════════════════════════════════════

/// Scan controller state. Never persisted; a fresh tracker is always `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanState::Stopped => "Stopped",
            ScanState::Running => "Running",
            ScanState::Paused => "Paused",
        };
        f.write_str(label)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tick Results
// ═══════════════════════════════════════════════════════════════════════════════

/// Why a tick did not ingest its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRunning,
    Offline,
    RestrictedMode,
    RateLimited,
    Detached,
}

/// Counts of what one ingested snapshot did to the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    /// Entities seen for the first time this session.
    pub added: usize,
    /// Entities that were invisible last tick and are visible again.
    pub reappeared: usize,
    /// Entities that stayed visible.
    pub refreshed: usize,
    /// Whether the debounced save ran during this tick.
    pub saved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Ingested(IngestSummary),
}

impl TickOutcome {
    pub fn is_ingested(&self) -> bool {
        matches!(self, TickOutcome::Ingested(_))
    }
}
