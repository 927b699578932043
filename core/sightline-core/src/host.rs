//! Collaborators supplied by the embedding application.
//!
//! The tracker never discovers entities itself. Each tick it asks a
//! [`SightingSource`] for the currently visible set, checks the [`HostStatus`]
//! guards and reads time from a [`Clock`].

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

use crate::types::Sighting;

/// Produces the snapshot of currently visible entities.
pub trait SightingSource {
    /// Returns every visible entity, minus the ones the source's own block
    /// list hides when `filter_blocked` is set.
    fn visible_entities(&mut self, filter_blocked: bool) -> Vec<Sighting>;
}

/// A fixed snapshot, used for replays and tests.
impl SightingSource for Vec<Sighting> {
    fn visible_entities(&mut self, _filter_blocked: bool) -> Vec<Sighting> {
        self.clone()
    }
}

/// Login and mode guards reported by the host.
pub trait HostStatus {
    fn is_online(&self) -> bool;
    fn is_restricted_mode(&self) -> bool;
}

/// Host guard values captured at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHost {
    pub online: bool,
    pub restricted: bool,
}

impl Default for StaticHost {
    fn default() -> Self {
        StaticHost {
            online: true,
            restricted: false,
        }
    }
}

impl HostStatus for StaticHost {
    fn is_online(&self) -> bool {
        self.online
    }

    fn is_restricted_mode(&self) -> bool {
        self.restricted
    }
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let other = clock.clone();
        clock.advance(Duration::seconds(5));
        assert_eq!(other.now(), start + Duration::seconds(5));
    }

    #[test]
    fn test_static_host_defaults_to_online() {
        let host = StaticHost::default();
        assert!(host.is_online());
        assert!(!host.is_restricted_mode());
    }
}
