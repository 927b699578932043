//! Rendering export candidates into clipboard text.
//!
//! ## Template Tokens
//!
//! | Token | Replaced with |
//! |-------|---------------|
//! | `{{names}}` | names list, one per line |
//! | `{{timestamp_utc}}` | export time, `YYYY-MM-DD HH:MM:SSZ` |
//! | `{{world}}` | the exporter's current world, or empty |
//! | `{{location}}` | the exporter's current location, or empty |
//!
//! Token matching is case-insensitive and happens in a single pass, so text
//! substituted for one token is never rescanned for others.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::history::HistoryRecord;
use crate::key::EntryKey;

static RE_TEMPLATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{\{(names|timestamp_utc|world|location)\}\}")
        .expect("template token pattern is valid")
});

/// Export candidates together with the keys they resolved from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportBatch {
    pub entries: Vec<HistoryRecord>,
    pub keys: Vec<EntryKey>,
}

impl ExportBatch {
    pub fn from_entries(entries: Vec<HistoryRecord>) -> Self {
        let keys = entries.iter().map(HistoryRecord::key).collect();
        ExportBatch { entries, keys }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where and when an export happens.
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub timestamp: DateTime<Utc>,
    pub world: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Names,
    NamesWithWorld,
    Template,
}

pub fn build_names_list(entries: &[HistoryRecord], include_world: bool) -> String {
    entries
        .iter()
        .map(|entry| {
            if include_world {
                format!("{}@{}", entry.name, entry.home_location_name)
            } else {
                entry.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_template(
    entries: &[HistoryRecord],
    template: &str,
    include_world: bool,
    context: &ExportContext,
) -> String {
    let names = build_names_list(entries, include_world);
    let timestamp = context.timestamp.format("%Y-%m-%d %H:%M:%SZ").to_string();
    let world = context.world.as_deref().unwrap_or_default();
    let location = context.location.as_deref().unwrap_or_default();

    RE_TEMPLATE_TOKEN
        .replace_all(template, |caps: &Captures| {
            match caps[1].to_ascii_lowercase().as_str() {
                "names" => names.clone(),
                "timestamp_utc" => timestamp.clone(),
                "world" => world.to_string(),
                _ => location.to_string(),
            }
        })
        .into_owned()
}

/// Renders a batch in the requested format. `Template` honours the
/// include-world flag; the two plain formats ignore it.
pub fn render(
    batch: &ExportBatch,
    format: ExportFormat,
    template: &str,
    include_world: bool,
    context: &ExportContext,
) -> String {
    match format {
        ExportFormat::Names => build_names_list(&batch.entries, false),
        ExportFormat::NamesWithWorld => build_names_list(&batch.entries, true),
        ExportFormat::Template => render_template(&batch.entries, template, include_world, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(name: &str, home: &str) -> HistoryRecord {
        let now = Utc::now();
        HistoryRecord {
            name: name.to_string(),
            home_location_id: 1,
            home_location_name: home.to_string(),
            last_seen_location_name: None,
            first_seen_at: now,
            last_seen_at: now,
            times_seen: 1,
            marked: true,
            first_marked_at: Some(now),
            last_marked_at: Some(now),
            exported: false,
            last_exported_at: None,
        }
    }

    fn context() -> ExportContext {
        ExportContext {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
            world: Some("Gaia".to_string()),
            location: None,
        }
    }

    #[test]
    fn test_names_list_with_and_without_world() {
        let entries = vec![entry("Aria", "Gaia"), entry("Bea", "Mana")];
        assert_eq!(build_names_list(&entries, false), "Aria\nBea");
        assert_eq!(build_names_list(&entries, true), "Aria@Gaia\nBea@Mana");
    }

    #[test]
    fn test_template_replaces_all_tokens() {
        let entries = vec![entry("Aria", "Gaia")];
        let out = render_template(
            &entries,
            "{{NAMES}} at {{timestamp_utc}} on {{World}} in [{{location}}]",
            false,
            &context(),
        );
        assert_eq!(out, "Aria at 2026-03-04 05:06:07Z on Gaia in []");
    }

    #[test]
    fn test_template_repeats_and_preserves_unicode() {
        let entries = vec![entry("Aria", "Gaia")];
        let out = render_template(&entries, "★ {{names}} / {{names}} ★", true, &context());
        assert_eq!(out, "★ Aria@Gaia / Aria@Gaia ★");
    }

    #[test]
    fn test_template_does_not_rescan_substituted_text() {
        let entries = vec![entry("{{World}}", "Gaia")];
        let out = render_template(&entries, "{{names}} / {{world}}", false, &context());
        assert_eq!(out, "{{World}} / Gaia");
    }

    #[test]
    fn test_template_leaves_unknown_tokens() {
        let out = render_template(&[], "{{names}}{{player}}", false, &context());
        assert_eq!(out, "{{player}}");
    }

    #[test]
    fn test_batch_keys_follow_entries() {
        let batch = ExportBatch::from_entries(vec![entry("Aria", "Gaia")]);
        assert_eq!(batch.keys, vec![EntryKey::new("aria", 1)]);
        assert_eq!(render(&batch, ExportFormat::Names, "", true, &context()), "Aria");
    }
}
