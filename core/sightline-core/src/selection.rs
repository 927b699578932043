//! User-curated set of keys to export.
//!
//! Pure membership: no validation against the tables. A stale key is harmless
//! because export resolution drops keys with no history record.

use std::collections::HashSet;

use crate::history::HistoryStore;
use crate::key::EntryKey;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: HashSet<EntryKey>,
}

impl SelectionSet {
    pub fn new() -> Self {
        SelectionSet::default()
    }

    /// Clears the set and reseeds it with every marked history key that is
    /// not yet exported (or every marked key when `include_exported`).
    pub fn reseed(&mut self, history: &HistoryStore, include_exported: bool) {
        self.keys.clear();
        self.keys
            .extend(history.default_export_keys(include_exported).cloned());
    }

    pub fn toggle(&mut self, key: &str, included: bool) {
        let key = EntryKey::parse(key);
        if included {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn insert(&mut self, key: EntryKey) {
        self.keys.insert(key);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.keys.remove(EntryKey::parse(key).as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(EntryKey::parse(key).as_str())
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryKey> {
        self.keys.iter()
    }
}
