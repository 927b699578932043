//! Durable cross-session sighting history.
//!
//! # Module Structure
//!
//! - [`store`]: the in-memory table, merge-on-sighting and age-based pruning
//! - [`persistence`]: the load/save collaborator and its JSON file backend
//! - [`types`]: the serialized [`HistoryRecord`]

mod persistence;
mod store;
mod types;

pub use persistence::{HistoryPersistence, JsonFilePersistence, MemoryPersistence, HISTORY_FILE_VERSION};
pub use store::{HistoryQuery, HistoryStore};
pub use types::HistoryRecord;
