//! Serialized history record. Current on-disk format is v1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::EntryKey;
use crate::session::SessionRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub name: String,
    pub home_location_id: u32,
    pub home_location_name: String,
    #[serde(default)]
    pub last_seen_location_name: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Visibility transitions across all sessions. Never decreases.
    #[serde(default)]
    pub times_seen: u32,
    #[serde(default)]
    pub marked: bool,
    /// Set on the first mark and never cleared, even after unmarking.
    #[serde(default)]
    pub first_marked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_marked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub last_exported_at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    pub(crate) fn from_session(
        session: &SessionRecord,
        seen_at: DateTime<Utc>,
        increment_seen: bool,
    ) -> Self {
        HistoryRecord {
            name: session.name.clone(),
            home_location_id: session.home_location_id,
            home_location_name: session.home_location_name.clone(),
            last_seen_location_name: session.current_location_name.clone(),
            first_seen_at: seen_at,
            last_seen_at: seen_at,
            times_seen: u32::from(increment_seen),
            marked: false,
            first_marked_at: None,
            last_marked_at: None,
            exported: false,
            last_exported_at: None,
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey::new(&self.name, self.home_location_id)
    }

    /// Marked and still owed an export (or exported entries are included by
    /// default). This is the default-selection predicate.
    pub fn is_default_export(&self, include_exported: bool) -> bool {
        self.marked && (!self.exported || include_exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(marked: bool, exported: bool) -> HistoryRecord {
        let now = Utc::now();
        HistoryRecord {
            name: "Aria".to_string(),
            home_location_id: 1,
            home_location_name: "Gaia".to_string(),
            last_seen_location_name: None,
            first_seen_at: now,
            last_seen_at: now,
            times_seen: 1,
            marked,
            first_marked_at: None,
            last_marked_at: None,
            exported,
            last_exported_at: None,
        }
    }

    #[test]
    fn test_default_export_predicate() {
        assert!(record(true, false).is_default_export(false));
        assert!(!record(true, true).is_default_export(false));
        assert!(record(true, true).is_default_export(true));
        assert!(!record(false, false).is_default_export(true));
    }

    #[test]
    fn test_missing_optional_fields_default_on_load() {
        let json = r#"{
            "name": "Aria",
            "home_location_id": 1,
            "home_location_name": "Gaia",
            "first_seen_at": "2026-01-01T00:00:00Z",
            "last_seen_at": "2026-01-02T00:00:00Z"
        }"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.times_seen, 0);
        assert!(!record.marked);
        assert!(record.first_marked_at.is_none());
    }
}
