//! `config show` and `config set`.

use sightline_core::{save_config, StorageConfig, SystemClock, TrackerConfig};
use tracing::info;

use crate::error::CliError;
use crate::with_tracker;

pub fn show(storage: &StorageConfig) -> Result<(), CliError> {
    with_tracker(storage, SystemClock, |tracker| {
        println!("{}", serde_json::to_string_pretty(tracker.config())?);
        Ok(())
    })
}

pub fn set(storage: &StorageConfig, field: &str, value: &str) -> Result<(), CliError> {
    with_tracker(storage, SystemClock, |tracker| {
        let mut config = tracker.config().clone();
        apply_field(&mut config, field, value)?;
        tracker.update_config(config);
        save_config(storage, tracker.config())?;
        info!(field, value, "Config updated");
        Ok(())
    })
}

/// Sets one field from its command-line spelling. Field names accept either
/// `snake_case` or `kebab-case`.
fn apply_field(config: &mut TrackerConfig, field: &str, value: &str) -> Result<(), CliError> {
    let invalid = || CliError::InvalidConfigValue {
        field: field.to_string(),
        value: value.to_string(),
    };
    let flag = || value.parse::<bool>().map_err(|_| invalid());

    match field.replace('-', "_").as_str() {
        "auto_prune_days" => {
            let days = value.parse::<i64>().map_err(|_| invalid())?;
            config.set_retention_days(days);
        }
        "include_exported_by_default" => config.include_exported_by_default = flag()?,
        "mark_exported_after_copy" => config.mark_exported_after_copy = flag()?,
        "include_world_in_names" => config.include_world_in_names = flag()?,
        "filter_blocked" => config.filter_blocked = flag()?,
        "export_template" => config.export_template = value.replace("\\n", "\n"),
        _ => return Err(CliError::UnknownConfigField(field.to_string())),
    }
    Ok(())
}
