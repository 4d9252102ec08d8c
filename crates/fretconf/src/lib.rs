//! Configuration loading for fretplay.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fretconf::FretConfig;
//!
//! let config = FretConfig::load().expect("Failed to load config");
//! println!("tempo: {} BPM", config.playback.tempo);
//! println!("tab voice: {}", config.voices.tab);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/fretplay/config.toml` (system)
//! 2. `~/.config/fretplay/config.toml` (user)
//! 3. `./fretplay.toml` (local override, or an explicit path)
//! 4. Environment variables (`FRETPLAY_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [playback]
//! tempo = 96.0
//! loop = true
//! tab_strum_ms = 20
//! event_strum_ms = 15
//!
//! [voices]
//! tab = "acoustic_guitar_nylon"
//! events = "acoustic_grand_piano"
//!
//! [envelope]
//! gain = 0.8
//! release = 0.5
//!
//! [telemetry]
//! log_level = "info,fretplay=debug"
//! ```

pub mod loader;
pub mod playback;
pub mod telemetry;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use playback::{EnvelopeConfig, PlaybackConfig, VoiceConfig};
pub use telemetry::TelemetryConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete fretplay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FretConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub voices: VoiceConfig,

    #[serde(default)]
    pub envelope: EnvelopeConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl FretConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` standing in for `./fretplay.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and return information about sources.
    pub fn load_with_sources() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_sources_from(None)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let table = loader::load_table(&path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let origin = sources
            .files
            .last()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<defaults>"));
        let mut config = loader::table_to_config(merged, &origin)?;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# fretplay configuration\n\n");

        output.push_str("[playback]\n");
        output.push_str(&format!("tempo = {:?}\n", self.playback.tempo));
        output.push_str(&format!("loop = {}\n", self.playback.looping));
        output.push_str(&format!("tab_strum_ms = {}\n", self.playback.tab_strum_ms));
        output.push_str(&format!("event_strum_ms = {}\n", self.playback.event_strum_ms));

        output.push_str("\n[voices]\n");
        output.push_str(&format!("tab = {:?}\n", self.voices.tab));
        output.push_str(&format!("events = {:?}\n", self.voices.events));

        output.push_str("\n[envelope]\n");
        output.push_str(&format!("gain = {:?}\n", self.envelope.gain));
        output.push_str(&format!("attack = {:?}\n", self.envelope.attack));
        output.push_str(&format!("decay = {:?}\n", self.envelope.decay));
        output.push_str(&format!("sustain = {:?}\n", self.envelope.sustain));
        output.push_str(&format!("release = {:?}\n", self.envelope.release));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {:?}\n", self.telemetry.log_level));

        output
    }
}
