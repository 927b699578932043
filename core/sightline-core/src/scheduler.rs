//! Tick rate limiting and save debouncing.
//!
//! Both are pure bookkeeping over caller-supplied timestamps; nothing here
//! sleeps or spawns.

use chrono::{DateTime, Duration, Utc};

/// Minimum spacing between ingested snapshots.
pub const UPDATE_INTERVAL_MS: i64 = 500;
/// Minimum spacing between non-forced history saves.
pub const SAVE_INTERVAL_SECS: i64 = 10;

/// Lets a tick through at most once per interval.
#[derive(Debug, Clone)]
pub struct TickGate {
    interval: Duration,
    last_update: Option<DateTime<Utc>>,
}

impl Default for TickGate {
    fn default() -> Self {
        TickGate::new(Duration::milliseconds(UPDATE_INTERVAL_MS))
    }
}

impl TickGate {
    pub fn new(interval: Duration) -> Self {
        TickGate {
            interval,
            last_update: None,
        }
    }

    /// Returns true and records `now` if the interval has elapsed.
    pub fn try_pass(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_update {
            if now.signed_duration_since(last) < self.interval {
                return false;
            }
        }
        self.last_update = Some(now);
        true
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

/// Dirty flag plus the time of the last successful save.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    interval: Duration,
    last_save: Option<DateTime<Utc>>,
    dirty: bool,
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        SaveDebouncer::new(Duration::seconds(SAVE_INTERVAL_SECS))
    }
}

impl SaveDebouncer {
    pub fn new(interval: Duration) -> Self {
        SaveDebouncer {
            interval,
            last_save: None,
            dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// A clean store never saves. A dirty one saves when forced or once the
    /// interval since the last successful save has elapsed.
    pub fn should_save(&self, now: DateTime<Utc>, force: bool) -> bool {
        if !self.dirty {
            return false;
        }
        if force {
            return true;
        }
        match self.last_save {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.interval,
        }
    }

    /// Only call after the save succeeded; a failed save stays dirty.
    pub fn record_save(&mut self, now: DateTime<Utc>) {
        self.dirty = false;
        self.last_save = Some(now);
    }

    pub fn last_save(&self) -> Option<DateTime<Utc>> {
        self.last_save
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_passes_first_tick() {
        let mut gate = TickGate::default();
        assert!(gate.try_pass(Utc::now()));
    }

    #[test]
    fn test_gate_blocks_within_interval() {
        let mut gate = TickGate::default();
        let t0 = Utc::now();
        assert!(gate.try_pass(t0));
        assert!(!gate.try_pass(t0 + Duration::milliseconds(499)));
        assert!(gate.try_pass(t0 + Duration::milliseconds(500)));
    }

    #[test]
    fn test_blocked_tick_does_not_move_window() {
        let mut gate = TickGate::default();
        let t0 = Utc::now();
        gate.try_pass(t0);
        gate.try_pass(t0 + Duration::milliseconds(300));
        assert_eq!(gate.last_update(), Some(t0));
    }

    #[test]
    fn test_clean_debouncer_never_saves() {
        let saver = SaveDebouncer::default();
        assert!(!saver.should_save(Utc::now(), true));
    }

    #[test]
    fn test_dirty_debouncer_respects_interval() {
        let mut saver = SaveDebouncer::default();
        let t0 = Utc::now();
        saver.mark_dirty();
        assert!(saver.should_save(t0, false));
        saver.record_save(t0);

        saver.mark_dirty();
        assert!(!saver.should_save(t0 + Duration::seconds(9), false));
        assert!(saver.should_save(t0 + Duration::seconds(9), true));
        assert!(saver.should_save(t0 + Duration::seconds(10), false));
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let mut saver = SaveDebouncer::default();
        saver.mark_dirty();
        // No record_save: the flush failed.
        assert!(saver.is_dirty());
        assert!(saver.last_save().is_none());
        assert!(saver.should_save(Utc::now(), false));
    }
}
