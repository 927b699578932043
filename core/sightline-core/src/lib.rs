//! # sightline-core
//!
//! Session-scoped presence tracking. Folds snapshots of currently visible
//! entities into a volatile session table and a durable history, with a
//! user-curated selection layered over both for export.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. The host drives ticks.
//! - **Not thread-safe**: One logical thread owns the tracker.
//! - **Graceful degradation**: Failed loads start empty, failed saves retry,
//!   invalid requests are no-ops.
//! - **Injected collaborators**: Snapshot source, host guards, clock and
//!   persistence are all passed in; nothing is global.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sightline_core::{PresenceTracker, StaticHost, StorageConfig, SystemClock, load_config};
//!
//! let storage = StorageConfig::from_home()?;
//! let mut tracker = PresenceTracker::new(load_config(&storage), storage.history_persistence(), SystemClock);
//! tracker.start_scan();
//! tracker.tick(&StaticHost::default(), &mut source);
//! tracker.shutdown()?;
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod host;
pub mod key;
pub mod scan;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod storage;
pub mod tracker;
pub mod types;

pub use config::*;
pub use error::{Result, SightlineError};
pub use export::{ExportBatch, ExportContext, ExportFormat};
pub use history::{
    HistoryPersistence, HistoryQuery, HistoryRecord, HistoryStore, JsonFilePersistence,
    MemoryPersistence,
};
pub use host::{Clock, HostStatus, ManualClock, SightingSource, StaticHost, SystemClock};
pub use key::EntryKey;
pub use scan::ScanController;
pub use selection::SelectionSet;
pub use session::{SessionRecord, SessionTable};
pub use storage::StorageConfig;
pub use tracker::PresenceTracker;
pub use types::*;
