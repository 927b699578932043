//! Canonical identity keys.
//!
//! An entity is identified by its name and home location id. The key is
//! `lowercase(trim(name)) + "@" + home_location_id`, so two sightings that
//! differ only in casing, surrounding whitespace or current location resolve
//! to the same entry in every table.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Case-insensitive identity of a sighted entity.
///
/// Always stored lowercased. Keys coming from outside (selection toggles,
/// export requests) go through [`EntryKey::parse`] so lookups stay
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
    pub fn new(name: &str, home_location_id: u32) -> Self {
        EntryKey(format!("{}@{}", name.trim(), home_location_id).to_lowercase())
    }

    /// Normalizes an already-built key string.
    pub fn parse(raw: &str) -> Self {
        EntryKey(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryKey {
    fn from(raw: &str) -> Self {
        EntryKey::parse(raw)
    }
}

impl From<String> for EntryKey {
    fn from(raw: String) -> Self {
        EntryKey::parse(&raw)
    }
}
