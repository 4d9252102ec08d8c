//! Config file discovery, loading, merging and environment overlay.

use crate::{ConfigError, FretConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files
/// that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files; an explicit path replaces the local override.
pub fn discover_config_files_with_override(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/fretplay/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("fretplay/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = explicit {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("fretplay.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a config file into a raw TOML table.
///
/// The table is also checked against [`FretConfig`] so type errors are
/// reported against the file that caused them.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    table_to_config(table.clone(), path)?;
    Ok(table)
}

/// Deserialize a (merged) table; missing keys take their defaults.
pub fn table_to_config(table: toml::Table, path: &Path) -> Result<FretConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in the overlay replaces the base value.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply `FRETPLAY_*` (and `RUST_LOG`) environment overrides.
pub fn apply_env_overrides(config: &mut FretConfig, sources: &mut ConfigSources) {
    apply_overrides_with(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_overrides_with<F>(config: &mut FretConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("FRETPLAY_TEMPO") {
        if let Ok(bpm) = v.parse() {
            config.playback.tempo = bpm;
            sources.env_overrides.push("FRETPLAY_TEMPO".to_string());
        }
    }
    if let Some(v) = lookup("FRETPLAY_LOOP") {
        if let Some(looping) = parse_flag(&v) {
            config.playback.looping = looping;
            sources.env_overrides.push("FRETPLAY_LOOP".to_string());
        }
    }

    if let Some(v) = lookup("FRETPLAY_TAB_VOICE") {
        config.voices.tab = v;
        sources.env_overrides.push("FRETPLAY_TAB_VOICE".to_string());
    }
    if let Some(v) = lookup("FRETPLAY_EVENT_VOICE") {
        config.voices.events = v;
        sources.env_overrides.push("FRETPLAY_EVENT_VOICE".to_string());
    }

    if let Some(v) = lookup("FRETPLAY_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("FRETPLAY_LOG_LEVEL".to_string());
    }
    // RUST_LOG wins over everything
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
