use sightline_core::{EntryKey, SightlineError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] SightlineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Invalid frame on line {line}: {source}")]
    Frame {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No history entry for {0}")]
    UnknownEntry(EntryKey),

    #[error("Unknown config field: {0}")]
    UnknownConfigField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidConfigValue { field: String, value: String },

    #[error("Refusing to reset history without --yes")]
    ResetNotConfirmed,
}
