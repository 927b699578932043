use chrono::Utc;
use sightline_core::{ExportContext, ExportFormat, StorageConfig, SystemClock};
use tracing::info;

use crate::error::CliError;
use crate::with_tracker;

/// Prints the export candidates: the selection if any, else marked entries.
/// With `finalize` set, the tracker's mark-exported-after-copy setting is
/// applied to what was printed.
pub fn run(
    storage: &StorageConfig,
    format: ExportFormat,
    finalize: bool,
    world: Option<String>,
    location: Option<String>,
) -> Result<(), CliError> {
    let context = ExportContext {
        timestamp: Utc::now(),
        world,
        location,
    };

    with_tracker(storage, SystemClock, |tracker| {
        let batch = tracker.export_entries();
        if batch.is_empty() {
            info!("Nothing to export");
            return Ok(());
        }

        let text = if finalize {
            tracker.copy_export(format, &context)
        } else {
            tracker.preview_export(format, &context)
        };
        println!("{}", text);
        info!(entries = batch.entries.len(), finalize, "Export written");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::{load_config, PresenceTracker, Sighting, StaticHost};

    fn seed(storage: &StorageConfig, names: &[&str]) {
        with_tracker(storage, SystemClock, |tracker| {
            tracker.start_scan();
            let snapshot: Vec<Sighting> = names
                .iter()
                .map(|name| Sighting {
                    name: name.to_string(),
                    home_location_id: 73,
                    home_location_name: "Gaia".to_string(),
                    current_location_name: None,
                })
                .collect();
            tracker.advance(Utc::now(), &StaticHost::default(), &snapshot);
            tracker.stop_scan();
            for name in names {
                tracker.toggle_marked(&format!("{}@73", name), true);
            }
            Ok(())
        })
        .unwrap();
    }

    fn exported(storage: &StorageConfig, key: &str) -> bool {
        let tracker =
            PresenceTracker::new(load_config(storage), storage.history_persistence(), SystemClock);
        tracker.history().get(key).is_some_and(|record| record.exported)
    }

    #[test]
    fn test_export_marks_entries_by_default() {
        let temp = tempfile::tempdir().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        seed(&storage, &["Aria"]);

        run(&storage, ExportFormat::Names, true, None, None).unwrap();
        assert!(exported(&storage, "aria@73"));
    }

    #[test]
    fn test_export_without_finalize_leaves_entries() {
        let temp = tempfile::tempdir().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        seed(&storage, &["Aria"]);

        run(
            &storage,
            ExportFormat::Template,
            false,
            Some("Gaia".to_string()),
            None,
        )
        .unwrap();
        assert!(!exported(&storage, "aria@73"));
    }

    #[test]
    fn test_export_with_nothing_marked_is_ok() {
        let temp = tempfile::tempdir().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        assert!(run(&storage, ExportFormat::Names, true, None, None).is_ok());
    }
}
