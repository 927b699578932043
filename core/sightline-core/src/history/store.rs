//! In-memory history table.
//!
//! Keyed by [`EntryKey`], at most one record per entity. Records are created on
//! first sighting and only leave through pruning or a full reset.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use super::types::HistoryRecord;
use crate::key::EntryKey;
use crate::session::SessionRecord;

/// Filters for the history listing.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub include_exported: bool,
    pub marked_only: bool,
    pub search: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStore {
    records: HashMap<EntryKey, HistoryRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        HistoryStore::default()
    }

    pub fn from_records(records: HashMap<EntryKey, HistoryRecord>) -> Self {
        HistoryStore { records }
    }

    pub fn records(&self) -> &HashMap<EntryKey, HistoryRecord> {
        &self.records
    }

    pub fn get(&self, key: &str) -> Option<&HistoryRecord> {
        self.records.get(EntryKey::parse(key).as_str())
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut HistoryRecord> {
        self.records.get_mut(EntryKey::parse(key).as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryKey, &HistoryRecord)> {
        self.records.iter()
    }

    /// Projects a session sighting into history.
    ///
    /// A new record starts at `times_seen = 1` when `increment_seen` is set,
    /// otherwise 0. An existing record always takes the latest timestamp and
    /// location names; `times_seen` only moves on a visibility transition.
    pub fn record_sighting(
        &mut self,
        key: &EntryKey,
        session: &SessionRecord,
        seen_at: DateTime<Utc>,
        increment_seen: bool,
    ) {
        match self.records.get_mut(key) {
            None => {
                self.records.insert(
                    key.clone(),
                    HistoryRecord::from_session(session, seen_at, increment_seen),
                );
            }
            Some(entry) => {
                entry.last_seen_at = seen_at;
                entry.last_seen_location_name = session.current_location_name.clone();
                entry.home_location_name = session.home_location_name.clone();
                if increment_seen {
                    entry.times_seen = entry.times_seen.saturating_add(1);
                }
            }
        }
    }

    /// Removes every record last seen before `now - retention_days`
    /// and returns the removed keys. A cutoff before the earliest
    /// representable time removes nothing.
    pub fn prune(&mut self, now: DateTime<Utc>, retention_days: i64) -> Vec<EntryKey> {
        let cutoff = Duration::try_days(retention_days.max(1))
            .and_then(|window| now.checked_sub_signed(window));
        let Some(cutoff) = cutoff else {
            return Vec::new();
        };
        let expired: Vec<EntryKey> = self
            .records
            .iter()
            .filter(|(_, record)| record.last_seen_at < cutoff)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.records.remove(key);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Keys passing the default-selection predicate.
    pub fn default_export_keys(&self, include_exported: bool) -> impl Iterator<Item = &EntryKey> {
        self.records
            .iter()
            .filter(move |(_, record)| record.is_default_export(include_exported))
            .map(|(key, _)| key)
    }

    /// History listing sorted by name (case-insensitive).
    pub fn query(&self, query: &HistoryQuery) -> Vec<(&EntryKey, &HistoryRecord)> {
        let needle = query.search.trim().to_lowercase();
        let mut matches: Vec<_> = self
            .records
            .iter()
            .filter(|(_, r)| query.include_exported || !r.exported)
            .filter(|(_, r)| !query.marked_only || r.marked)
            .filter(|(_, r)| {
                needle.is_empty()
                    || r.name.to_lowercase().contains(&needle)
                    || r.home_location_name.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by_cached_key(|(_, r)| r.name.to_lowercase());
        matches
    }
}
