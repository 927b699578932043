//! History listing, marking and maintenance commands.

use sightline_core::{EntryKey, HistoryQuery, HistoryRecord, StorageConfig, SystemClock};
use tracing::info;

use crate::error::CliError;
use crate::with_tracker;

pub fn list(
    storage: &StorageConfig,
    include_exported: bool,
    marked_only: bool,
    search: Option<String>,
) -> Result<(), CliError> {
    let query = HistoryQuery {
        include_exported,
        marked_only,
        search: search.unwrap_or_default(),
    };

    with_tracker(storage, SystemClock, |tracker| {
        for (_, record) in tracker.history_entries(&query) {
            println!("{}", format_history_row(record));
        }
        Ok(())
    })
}

pub fn set_marked(
    storage: &StorageConfig,
    name: &str,
    home_id: u32,
    marked: bool,
) -> Result<(), CliError> {
    let key = EntryKey::new(name, home_id);

    with_tracker(storage, SystemClock, |tracker| {
        if !tracker.history().contains(key.as_str()) {
            return Err(CliError::UnknownEntry(key));
        }
        if tracker.toggle_marked(key.as_str(), marked) {
            info!(key = %key, marked, "Entry updated");
        } else {
            info!(key = %key, marked, "Entry already in that state");
        }
        Ok(())
    })
}

pub fn prune(storage: &StorageConfig) -> Result<(), CliError> {
    // Opening the tracker already prunes; report what is left.
    with_tracker(storage, SystemClock, |tracker| {
        let removed = tracker.prune_history();
        info!(
            removed,
            remaining = tracker.history().len(),
            retention_days = tracker.config().retention_days(),
            "Prune finished"
        );
        Ok(())
    })
}

pub fn reset(storage: &StorageConfig, confirmed: bool) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::ResetNotConfirmed);
    }
    with_tracker(storage, SystemClock, |tracker| {
        tracker.reset_history();
        Ok(())
    })
}

fn format_history_row(record: &HistoryRecord) -> String {
    let flags = format!(
        "{}{}",
        if record.marked { 'M' } else { '-' },
        if record.exported { 'E' } else { '-' }
    );
    format!(
        "{} {:<24} {:<16} seen {:>3}  last {}",
        flags,
        record.name,
        record.home_location_name,
        record.times_seen,
        record.last_seen_at.format("%Y-%m-%d %H:%M"),
    )
}
