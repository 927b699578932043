//! Volatile per-scan session table.
//!
//! Records are created on first sighting and never removed on disappearance;
//! an entity that leaves the snapshot just has its `is_visible` flag dropped.
//! The whole table is cleared on scan start, scan stop and explicit clear.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::key::EntryKey;
use crate::types::Sighting;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub name: String,
    pub home_location_id: u32,
    pub home_location_name: String,
    pub current_location_name: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Number of invisible→visible transitions this session, starting at 1.
    pub seen_count: u32,
    pub is_visible: bool,
}

impl SessionRecord {
    fn from_sighting(sighting: &Sighting, now: DateTime<Utc>) -> Self {
        SessionRecord {
            name: sighting.name.clone(),
            home_location_id: sighting.home_location_id,
            home_location_name: sighting.home_location_name.clone(),
            current_location_name: sighting.current_location_name.clone(),
            first_seen_at: now,
            last_seen_at: now,
            seen_count: 1,
            is_visible: true,
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey::new(&self.name, self.home_location_id)
    }
}

/// What a sighting did to its session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First sighting this session.
    New,
    /// Was invisible last tick, visible again now.
    Reappeared,
    /// Was already visible last tick.
    StillVisible,
}

impl Observation {
    /// Whether this observation counts as a visibility transition.
    pub fn is_transition(self) -> bool {
        !matches!(self, Observation::StillVisible)
    }
}

#[derive(Debug, Default)]
pub struct SessionTable {
    entries: HashMap<EntryKey, SessionRecord>,
    /// Keys that were visible when the current tick began.
    visible_last_tick: HashSet<EntryKey>,
}

impl SessionTable {
    pub fn new() -> Self {
        SessionTable::default()
    }

    /// Start of tick: nothing is visible until the snapshot says so.
    ///
    /// The pre-reset visibility is remembered so `observe` can tell a
    /// reappearance from an entity that simply stayed in view.
    pub fn begin_tick(&mut self) {
        self.visible_last_tick.clear();
        for (key, record) in self.entries.iter_mut() {
            if record.is_visible {
                self.visible_last_tick.insert(key.clone());
            }
            record.is_visible = false;
        }
    }

    /// Folds one sighting into the table. Call [`SessionTable::begin_tick`]
    /// once before the first `observe` of a tick.
    pub fn observe(&mut self, sighting: &Sighting, now: DateTime<Utc>) -> (EntryKey, Observation) {
        let key = sighting.key();

        let observation = match self.entries.get_mut(&key) {
            None => {
                self.entries
                    .insert(key.clone(), SessionRecord::from_sighting(sighting, now));
                Observation::New
            }
            Some(record) => {
                // A duplicate in the same snapshot already flipped the flag.
                let was_visible = record.is_visible || self.visible_last_tick.contains(&key);
                record.is_visible = true;
                record.last_seen_at = now;
                record.current_location_name = sighting.current_location_name.clone();
                if was_visible {
                    Observation::StillVisible
                } else {
                    record.seen_count += 1;
                    Observation::Reappeared
                }
            }
        };

        (key, observation)
    }

    pub fn get(&self, key: &str) -> Option<&SessionRecord> {
        self.entries.get(EntryKey::parse(key).as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.visible_last_tick.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryKey, &SessionRecord)> {
        self.entries.iter()
    }

    /// Records whose name or home location name contains `query`
    /// (case-insensitive), sorted by name. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<(&EntryKey, &SessionRecord)> {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, record)| {
                needle.is_empty()
                    || record.name.to_lowercase().contains(&needle)
                    || record.home_location_name.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by_cached_key(|(_, record)| record.name.to_lowercase());
        matches
    }
}
