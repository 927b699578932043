//! sightline: terminal driver for presence scans and history curation.
//!
//! Every command opens the tracker over a data directory (default
//! `~/.sightline`), does its work and shuts the tracker down, which forces a
//! final save.
//!
//! ## Subcommands
//!
//! - `replay`: Feed recorded snapshot frames through a scan
//! - `history`: List history records
//! - `mark` / `unmark`: Flag a history record for export
//! - `export`: Render the export candidates to stdout
//! - `prune` / `reset`: History maintenance
//! - `config`: Show or change tracker settings

mod curate;
mod error;
mod export;
mod logging;
mod replay;
mod settings;

use clap::{Parser, Subcommand, ValueEnum};
use sightline_core::{load_config, Clock, JsonFilePersistence, PresenceTracker, StorageConfig};
use std::path::PathBuf;

use crate::error::CliError;

pub(crate) type Tracker = PresenceTracker<JsonFilePersistence>;

#[derive(Parser)]
#[command(name = "sightline")]
#[command(about = "Session presence tracker")]
#[command(version)]
struct Cli {
    /// Data directory holding config.json, history.json and logs
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded snapshot frames (one JSON object per line)
    Replay {
        #[arg(value_name = "FRAMES")]
        frames: PathBuf,

        /// Pause the scan once this many frames have been fed
        #[arg(long, value_name = "N")]
        pause_after: Option<usize>,
    },

    /// List history records
    History {
        /// Include records already exported
        #[arg(long)]
        include_exported: bool,

        /// Only show marked records
        #[arg(long)]
        marked_only: bool,

        /// Case-insensitive filter over name and home location
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
    },

    /// Mark a history record for export
    Mark {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "HOME_ID")]
        home_id: u32,
    },

    /// Clear the marked flag of a history record
    Unmark {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "HOME_ID")]
        home_id: u32,
    },

    /// Print the export candidates
    Export {
        #[arg(long, value_enum, default_value_t = ExportStyle::Names)]
        format: ExportStyle,

        /// Do not flag the exported records, even if configured to
        #[arg(long)]
        no_mark: bool,

        /// World name substituted into templates
        #[arg(long)]
        world: Option<String>,

        /// Location name substituted into templates
        #[arg(long)]
        location: Option<String>,
    },

    /// Drop records past the retention window
    Prune,

    /// Delete all history
    Reset {
        #[arg(long)]
        yes: bool,
    },

    /// Show or change tracker settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as JSON
    Show,

    /// Set one field and save
    Set {
        #[arg(value_name = "FIELD")]
        field: String,

        #[arg(value_name = "VALUE")]
        value: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportStyle {
    /// One name per line
    Names,
    /// One `name@home` per line
    World,
    /// The configured export template
    Template,
}

fn main() {
    let cli = Cli::parse();
    let storage = match cli.data_dir {
        Some(root) => Ok(StorageConfig::with_root(root)),
        None => StorageConfig::from_home(),
    };
    let logs_dir = storage.as_ref().ok().map(StorageConfig::logs_dir);
    let logging_guard = logging::init(logs_dir.as_deref());

    let result = storage
        .map_err(CliError::from)
        .and_then(|storage| run(cli.command, &storage));

    if let Err(e) = result {
        tracing::error!(error = %e, "sightline failed");
        drop(logging_guard);
        std::process::exit(1);
    }
}

fn run(command: Commands, storage: &StorageConfig) -> Result<(), CliError> {
    storage.ensure_root()?;

    match command {
        Commands::Replay {
            frames,
            pause_after,
        } => replay::run(storage, &frames, pause_after),
        Commands::History {
            include_exported,
            marked_only,
            search,
        } => curate::list(storage, include_exported, marked_only, search),
        Commands::Mark { name, home_id } => curate::set_marked(storage, &name, home_id, true),
        Commands::Unmark { name, home_id } => curate::set_marked(storage, &name, home_id, false),
        Commands::Export {
            format,
            no_mark,
            world,
            location,
        } => export::run(storage, format.into(), !no_mark, world, location),
        Commands::Prune => curate::prune(storage),
        Commands::Reset { yes } => curate::reset(storage, yes),
        Commands::Config { action } => match action {
            ConfigAction::Show => settings::show(storage),
            ConfigAction::Set { field, value } => settings::set(storage, &field, &value),
        },
    }
}

impl From<ExportStyle> for sightline_core::ExportFormat {
    fn from(style: ExportStyle) -> Self {
        match style {
            ExportStyle::Names => sightline_core::ExportFormat::Names,
            ExportStyle::World => sightline_core::ExportFormat::NamesWithWorld,
            ExportStyle::Template => sightline_core::ExportFormat::Template,
        }
    }
}

/// Opens the tracker, runs `body` and always shuts down afterwards. The body's
/// error wins over a shutdown error.
pub(crate) fn with_tracker<C, F>(
    storage: &StorageConfig,
    clock: C,
    body: F,
) -> Result<(), CliError>
where
    C: Clock + 'static,
    F: FnOnce(&mut Tracker) -> Result<(), CliError>,
{
    let mut tracker = PresenceTracker::new(
        load_config(storage),
        storage.history_persistence(),
        clock,
    );
    let outcome = body(&mut tracker);
    let shutdown = tracker.shutdown();
    outcome?;
    shutdown?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::SystemClock;

    #[test]
    fn test_cli_parses_history_flags() {
        let cli = Cli::try_parse_from([
            "sightline",
            "--data-dir",
            "/tmp/sl",
            "history",
            "--marked-only",
            "--search",
            "ari",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/sl")));
        match cli.command {
            Commands::History {
                include_exported,
                marked_only,
                search,
            } => {
                assert!(!include_exported);
                assert!(marked_only);
                assert_eq!(search.as_deref(), Some("ari"));
            }
            _ => panic!("expected history command"),
        }
    }

    #[test]
    fn test_cli_parses_export_format() {
        let cli = Cli::try_parse_from(["sightline", "export", "--format", "world", "--no-mark"])
            .unwrap();
        match cli.command {
            Commands::Export {
                format, no_mark, ..
            } => {
                assert_eq!(format, ExportStyle::World);
                assert!(no_mark);
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_cli_rejects_non_numeric_home_id() {
        assert!(Cli::try_parse_from(["sightline", "mark", "Aria", "gaia"]).is_err());
    }

    #[test]
    fn test_with_tracker_shuts_down_on_body_error() {
        let temp = tempfile::tempdir().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());

        let frames = temp.path().join("frames.jsonl");
        let frame = format!(
            r#"{{"at":"{}","visible":[{{"name":"Aria","home_location_id":73,"home_location_name":"Gaia"}}]}}"#,
            chrono::Utc::now().to_rfc3339()
        );
        fs_err::write(&frames, frame).unwrap();
        replay::run(&storage, &frames, None).unwrap();

        let result = with_tracker(&storage, SystemClock, |tracker| {
            tracker.toggle_marked("aria@73", true);
            Err(CliError::ResetNotConfirmed)
        });
        assert!(matches!(result, Err(CliError::ResetNotConfirmed)));

        let tracker = PresenceTracker::new(
            load_config(&storage),
            storage.history_persistence(),
            SystemClock,
        );
        assert!(tracker.is_marked("aria@73"));
    }
}
