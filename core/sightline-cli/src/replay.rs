//! Replays recorded snapshot frames through a scan.
//!
//! A frames file holds one JSON object per line:
//!
//! ```text
//! {"at":"2026-05-01T12:00:00Z","online":true,"restricted":false,"visible":[...]}
//! ```
//!
//! Time comes from the frames, not the wall clock, so a replay is
//! deterministic.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sightline_core::{ManualClock, SessionRecord, Sighting, StaticHost, StorageConfig, TickOutcome};
use std::path::Path;
use tracing::info;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    pub at: DateTime<Utc>,
    #[serde(default = "default_online")]
    pub online: bool,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub visible: Vec<Sighting>,
}

fn default_online() -> bool {
    true
}

impl Frame {
    fn host(&self) -> StaticHost {
        StaticHost {
            online: self.online,
            restricted: self.restricted,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub ingested: usize,
    pub skipped: usize,
    pub added: usize,
    pub reappeared: usize,
}

impl ReplayReport {
    fn record(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Ingested(summary) => {
                self.ingested += 1;
                self.added += summary.added;
                self.reappeared += summary.reappeared;
            }
            TickOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Parses a frames file. Blank lines are ignored; line numbers in errors are
/// 1-based.
pub fn parse_frames(text: &str) -> Result<Vec<Frame>, CliError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| CliError::Frame {
                line: index + 1,
                source,
            })
        })
        .collect()
}

pub fn run(
    storage: &StorageConfig,
    path: &Path,
    pause_after: Option<usize>,
) -> Result<(), CliError> {
    let frames = parse_frames(&fs_err::read_to_string(path)?)?;
    let start = frames.first().map(|frame| frame.at).unwrap_or_else(Utc::now);
    let clock = ManualClock::new(start);

    crate::with_tracker(storage, clock.clone(), |tracker| {
        tracker.start_scan();

        let mut report = ReplayReport::default();
        for (index, frame) in frames.iter().enumerate() {
            if pause_after == Some(index) {
                tracker.pause_scan();
            }
            clock.set(frame.at);
            let outcome = tracker.advance(frame.at, &frame.host(), &frame.visible);
            report.record(&outcome);
        }

        // Stopping clears the session table, so render it first.
        let rows: Vec<String> = tracker
            .session_entries("")
            .into_iter()
            .map(|(_, record)| format_session_row(record))
            .collect();
        tracker.stop_scan();

        for row in rows {
            println!("{}", row);
        }
        info!(
            frames = frames.len(),
            ingested = report.ingested,
            skipped = report.skipped,
            added = report.added,
            reappeared = report.reappeared,
            "Replay finished"
        );
        Ok(())
    })
}

fn format_session_row(record: &SessionRecord) -> String {
    format!(
        "{:<24} {:<16} seen {:>3}  {} .. {}",
        record.name,
        record.home_location_name,
        record.seen_count,
        record.first_seen_at.format("%Y-%m-%d %H:%M:%S"),
        record.last_seen_at.format("%H:%M:%S"),
    )
}
