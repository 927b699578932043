//! PresenceTracker - the entry point for embedding applications.
//!
//! Owns the session table, the history store, the selection set and the scan
//! controller. The host drives it by calling [`PresenceTracker::tick`] (or
//! [`PresenceTracker::advance`] with an explicit timestamp and snapshot) from
//! its own scheduler; the UI layer calls the curation methods in between.
//!
//! ## Tick Path
//!
//! ```text
//! tick ─▶ gates (detached, running, online, restricted, 500ms) ─▶ snapshot
//!      ─▶ session table ─▶ history merge ─▶ debounced save (10s)
//! ```
//!
//! ## Threading
//!
//! Not thread-safe and not meant to be: every method, ticks included, must run
//! on the same logical thread. Wrap in a `Mutex` if the host needs sharing.
//!
//! ## Persistence
//!
//! Saves run synchronously on the calling thread. Tick saves are debounced;
//! stop, teardown and curation operations force a save. A failed save is
//! logged, keeps the dirty flag and is retried on the next eligible tick.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::{Result, SightlineError};
use crate::export::{self, ExportBatch, ExportContext, ExportFormat};
use crate::history::{HistoryPersistence, HistoryQuery, HistoryRecord, HistoryStore};
use crate::host::{Clock, HostStatus, SightingSource};
use crate::key::EntryKey;
use crate::scan::{ScanCommand, ScanController};
use crate::scheduler::{SaveDebouncer, TickGate};
use crate::selection::SelectionSet;
use crate::session::{Observation, SessionRecord, SessionTable};
use crate::types::{IngestSummary, ScanState, Sighting, SkipReason, TickOutcome};

pub struct PresenceTracker<P: HistoryPersistence> {
    config: TrackerConfig,
    persistence: P,
    clock: Box<dyn Clock>,
    scan: ScanController,
    session: SessionTable,
    history: HistoryStore,
    selection: SelectionSet,
    tick_gate: TickGate,
    saver: SaveDebouncer,
    detached: bool,
}

impl<P: HistoryPersistence> PresenceTracker<P> {
    /// Loads history, seeds the default selection and prunes expired records.
    ///
    /// A failed load leaves history empty rather than partially populated.
    pub fn new(config: TrackerConfig, mut persistence: P, clock: impl Clock + 'static) -> Self {
        let history = match persistence.load() {
            Ok(history) => history,
            Err(err) => {
                warn!(error = %err, "Failed to load history; starting empty");
                HistoryStore::new()
            }
        };
        info!(records = history.len(), "History loaded");

        let mut tracker = PresenceTracker {
            config: config.normalized(),
            persistence,
            clock: Box::new(clock),
            scan: ScanController::new(),
            session: SessionTable::new(),
            history,
            selection: SelectionSet::new(),
            tick_gate: TickGate::default(),
            saver: SaveDebouncer::default(),
            detached: false,
        };
        tracker.initialize_default_selection();
        tracker.prune_history();
        tracker
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> ScanState {
        self.scan.state()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionTable {
        &self.session
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Whether the history record for `key` is marked. Unknown keys are not.
    pub fn is_marked(&self, key: &str) -> bool {
        self.history.get(key).is_some_and(|record| record.marked)
    }

    pub fn has_pending_save(&self) -> bool {
        self.saver.is_dirty()
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Session records matching `search`, sorted by name.
    pub fn session_entries(&self, search: &str) -> Vec<(&EntryKey, &SessionRecord)> {
        self.session.search(search)
    }

    pub fn history_entries(&self, query: &HistoryQuery) -> Vec<(&EntryKey, &HistoryRecord)> {
        self.history.query(query)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Scan Control
    // ─────────────────────────────────────────────────────────────────────────────

    /// Starts a fresh scan. Session progress and the current selection are
    /// discarded; history is untouched.
    pub fn start_scan(&mut self) {
        self.scan.apply(ScanCommand::Start);
        self.session.clear();
        self.selection.clear();
        info!("Scan started");
    }

    pub fn pause_scan(&mut self) {
        if self.scan.apply(ScanCommand::Pause).is_some() {
            info!("Scan paused");
        }
    }

    pub fn resume_scan(&mut self) {
        if self.scan.apply(ScanCommand::Resume).is_some() {
            info!("Scan resumed");
        }
    }

    /// Stops the scan, clears the session table and flushes pending history
    /// regardless of the debounce window.
    pub fn stop_scan(&mut self) {
        if self.scan.apply(ScanCommand::Stop).is_some() {
            info!(session_entries = self.session.len(), "Scan stopped");
        }
        self.session.clear();
        let now = self.clock.now();
        self.save_if_needed(now, true);
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
        self.selection.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Tick Path
    // ─────────────────────────────────────────────────────────────────────────────

    /// One scheduler invocation: checks the gates, then pulls a snapshot from
    /// `source` and folds it in. The snapshot is only requested when the tick
    /// will actually ingest it.
    pub fn tick(&mut self, host: &dyn HostStatus, source: &mut dyn SightingSource) -> TickOutcome {
        let now = self.clock.now();
        if let Err(reason) = self.check_gates(now, host) {
            return TickOutcome::Skipped(reason);
        }
        let snapshot = source.visible_entities(self.config.filter_blocked);
        TickOutcome::Ingested(self.ingest(now, &snapshot))
    }

    /// Like [`PresenceTracker::tick`] with the time and snapshot supplied by
    /// the caller.
    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
        host: &dyn HostStatus,
        snapshot: &[Sighting],
    ) -> TickOutcome {
        if let Err(reason) = self.check_gates(now, host) {
            return TickOutcome::Skipped(reason);
        }
        TickOutcome::Ingested(self.ingest(now, snapshot))
    }

    fn check_gates(
        &mut self,
        now: DateTime<Utc>,
        host: &dyn HostStatus,
    ) -> std::result::Result<(), SkipReason> {
        if self.detached {
            return Err(SkipReason::Detached);
        }
        if !self.scan.accepts_snapshots() {
            return Err(SkipReason::NotRunning);
        }
        if !host.is_online() {
            return Err(SkipReason::Offline);
        }
        if host.is_restricted_mode() {
            return Err(SkipReason::RestrictedMode);
        }
        // Checked last so a gated tick never consumes the rate window.
        if !self.tick_gate.try_pass(now) {
            return Err(SkipReason::RateLimited);
        }
        Ok(())
    }

    fn ingest(&mut self, now: DateTime<Utc>, snapshot: &[Sighting]) -> IngestSummary {
        let mut summary = IngestSummary::default();
        self.session.begin_tick();

        for sighting in snapshot {
            let (key, observation) = self.session.observe(sighting, now);
            match observation {
                Observation::New => summary.added += 1,
                Observation::Reappeared => summary.reappeared += 1,
                Observation::StillVisible => summary.refreshed += 1,
            }

            if let Some(record) = self.session.get(key.as_str()) {
                self.history
                    .record_sighting(&key, record, now, observation.is_transition());
                self.saver.mark_dirty();
            }
        }

        debug!(
            visible = snapshot.len(),
            added = summary.added,
            reappeared = summary.reappeared,
            "Snapshot ingested"
        );

        summary.saved = self.save_if_needed(now, false);
        summary
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────────

    /// Saves when dirty and either forced or outside the debounce window.
    /// Failures are logged and left dirty for the next attempt.
    fn save_if_needed(&mut self, now: DateTime<Utc>, force: bool) -> bool {
        if self.detached || !self.saver.should_save(now, force) {
            return false;
        }

        match self.persistence.save(&self.history) {
            Ok(()) => {
                self.saver.record_save(now);
                debug!(records = self.history.len(), forced = force, "History saved");
                true
            }
            Err(err) => {
                warn!(error = %err, "Failed to save history; will retry");
                false
            }
        }
    }

    fn persist_now(&mut self) {
        self.saver.mark_dirty();
        let now = self.clock.now();
        self.save_if_needed(now, true);
    }

    /// Forces a save of pending changes and reports the outcome.
    pub fn flush(&mut self) -> Result<()> {
        if self.detached {
            return Err(SightlineError::Detached);
        }
        if !self.saver.is_dirty() {
            return Ok(());
        }
        let now = self.clock.now();
        self.persistence.save(&self.history)?;
        self.saver.record_save(now);
        Ok(())
    }

    /// Final save, then detach: later ticks are skipped and later saves are
    /// not attempted. Calling it twice is harmless.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.detached {
            return Ok(());
        }
        let result = self.flush();
        self.detached = true;
        info!(records = self.history.len(), "Tracker shut down");
        result
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Selection and Marking
    // ─────────────────────────────────────────────────────────────────────────────

    /// Reseeds the selection from marked history entries. Re-run whenever
    /// the include-exported flag changes.
    pub fn initialize_default_selection(&mut self) {
        self.selection
            .reseed(&self.history, self.config.include_exported_by_default);
    }

    pub fn toggle_selection(&mut self, key: &str, included: bool) {
        self.selection.toggle(key, included);
    }

    /// Marks or unmarks a history entry. Returns false if the key has no
    /// record or the flag already had that value.
    ///
    /// Unmarking keeps `first_marked_at` and leaves the key selected;
    /// selection and marking are independent once a key is selected.
    pub fn toggle_marked(&mut self, key: &str, marked: bool) -> bool {
        let now = self.clock.now();
        let Some(entry) = self.history.get_mut(key) else {
            return false;
        };
        if entry.marked == marked {
            return false;
        }

        entry.marked = marked;
        entry.last_marked_at = Some(now);
        if marked {
            entry.first_marked_at.get_or_insert(now);
            if !entry.exported {
                self.selection.insert(entry.key());
            }
        }
        debug!(key = %key, marked, "Marked flag changed");

        self.persist_now();
        true
    }

    /// Flags the given keys as exported. Keys without a history record are
    /// skipped. Returns how many records were updated.
    pub fn mark_exported<I, K>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let now = self.clock.now();
        let mut updated = 0;
        for key in keys {
            let key = key.as_ref();
            let Some(entry) = self.history.get_mut(key) else {
                continue;
            };
            entry.exported = true;
            entry.last_exported_at = Some(now);
            if !self.config.include_exported_by_default {
                self.selection.remove(key);
            }
            updated += 1;
        }

        self.persist_now();
        updated
    }

    /// Sets or clears the exported flag of one entry by hand. Setting keeps an
    /// existing export timestamp; clearing drops it.
    pub fn set_exported(&mut self, key: &str, exported: bool) -> bool {
        let now = self.clock.now();
        let Some(entry) = self.history.get_mut(key) else {
            return false;
        };

        entry.exported = exported;
        entry.last_exported_at = if exported {
            Some(entry.last_exported_at.unwrap_or(now))
        } else {
            None
        };
        if exported && !self.config.include_exported_by_default {
            self.selection.remove(key);
        }

        self.persist_now();
        true
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // History Maintenance
    // ─────────────────────────────────────────────────────────────────────────────

    /// Drops records last seen before the retention cutoff, along with their
    /// selection entries. Returns the number of records removed.
    pub fn prune_history(&mut self) -> usize {
        let now = self.clock.now();
        let removed = self.history.prune(now, self.config.retention_days());
        for key in &removed {
            self.selection.remove(key.as_str());
        }

        if !removed.is_empty() {
            info!(
                removed = removed.len(),
                retention_days = self.config.retention_days(),
                "History pruned"
            );
            self.persist_now();
        }
        removed.len()
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
        self.selection.clear();
        info!("History reset");
        self.persist_now();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────────

    /// Marked entries that are not yet exported (or all marked entries when
    /// exported ones are included by default), sorted by name.
    pub fn default_export_entries(&self) -> Vec<HistoryRecord> {
        let include_exported = self.config.include_exported_by_default;
        let entries = self
            .history
            .iter()
            .filter(|(_, record)| record.is_default_export(include_exported))
            .map(|(_, record)| record.clone())
            .collect();
        sort_by_name(entries)
    }

    /// Selected keys resolved against history, sorted by name. Keys with no
    /// record are dropped.
    pub fn selected_export_entries(&self) -> Vec<HistoryRecord> {
        let entries = self
            .selection
            .iter()
            .filter_map(|key| self.history.get(key.as_str()))
            .cloned()
            .collect();
        sort_by_name(entries)
    }

    /// The selection if it is non-empty, otherwise the default candidates.
    pub fn export_entries(&self) -> ExportBatch {
        let entries = if self.has_selection() {
            self.selected_export_entries()
        } else {
            self.default_export_entries()
        };
        ExportBatch::from_entries(entries)
    }

    /// Applies mark-exported-after-copy to a batch that was handed out.
    pub fn complete_export(&mut self, batch: &ExportBatch) -> usize {
        if !self.config.mark_exported_after_copy || batch.keys.is_empty() {
            return 0;
        }
        self.mark_exported(&batch.keys)
    }

    /// Renders the current export candidates without side effects.
    pub fn preview_export(&self, format: ExportFormat, context: &ExportContext) -> String {
        let batch = self.export_entries();
        export::render(
            &batch,
            format,
            &self.config.export_template,
            self.config.include_world_in_names,
            context,
        )
    }

    /// Renders the current export candidates and completes the export.
    pub fn copy_export(&mut self, format: ExportFormat, context: &ExportContext) -> String {
        let batch = self.export_entries();
        let text = export::render(
            &batch,
            format,
            &self.config.export_template,
            self.config.include_world_in_names,
            context,
        );
        self.complete_export(&batch);
        text
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────────

    /// Replaces the configuration. Retention is clamped; a change to any export
    /// flag reseeds the default selection.
    pub fn update_config(&mut self, config: TrackerConfig) {
        let config = config.normalized();
        let reseed = self.config.export_flags_differ(&config);
        self.config = config;
        if reseed {
            self.initialize_default_selection();
        }
    }

    pub fn set_retention_days(&mut self, days: i64) {
        self.config.set_retention_days(days);
    }
}

fn sort_by_name(mut entries: Vec<HistoryRecord>) -> Vec<HistoryRecord> {
    entries.sort_by_cached_key(|entry| entry.name.to_lowercase());
    entries
}
