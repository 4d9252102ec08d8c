//! Playback defaults: tempo, strum spread, voices and note envelope.

use serde::{Deserialize, Serialize};

/// Scheduler defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Tempo in BPM when the caller does not pick one
    #[serde(default = "PlaybackConfig::default_tempo")]
    pub tempo: f64,

    /// Restart from the top after a completed pass
    #[serde(default, rename = "loop")]
    pub looping: bool,

    /// Spread between chord notes in tab mode, milliseconds
    #[serde(default = "PlaybackConfig::default_tab_strum_ms")]
    pub tab_strum_ms: u64,

    /// Spread between chord notes for instrument events, milliseconds
    #[serde(default = "PlaybackConfig::default_event_strum_ms")]
    pub event_strum_ms: u64,
}

impl PlaybackConfig {
    fn default_tempo() -> f64 {
        120.0
    }

    fn default_tab_strum_ms() -> u64 {
        20
    }

    fn default_event_strum_ms() -> u64 {
        15
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tempo: Self::default_tempo(),
            looping: false,
            tab_strum_ms: Self::default_tab_strum_ms(),
            event_strum_ms: Self::default_event_strum_ms(),
        }
    }
}

/// Which sampled voice each playback mode loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "VoiceConfig::default_tab")]
    pub tab: String,

    #[serde(default = "VoiceConfig::default_events")]
    pub events: String,
}

impl VoiceConfig {
    fn default_tab() -> String {
        "acoustic_guitar_steel".to_string()
    }

    fn default_events() -> String {
        "acoustic_grand_piano".to_string()
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tab: Self::default_tab(),
            events: Self::default_events(),
        }
    }
}

/// ADSR shape applied to every triggered note. Times are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Gain used when a note carries no velocity (tab mode)
    #[serde(default = "EnvelopeConfig::default_gain")]
    pub gain: f32,

    #[serde(default = "EnvelopeConfig::default_attack")]
    pub attack: f64,

    #[serde(default = "EnvelopeConfig::default_decay")]
    pub decay: f64,

    /// Sustain level, 0.0 - 1.0
    #[serde(default = "EnvelopeConfig::default_sustain")]
    pub sustain: f32,

    #[serde(default = "EnvelopeConfig::default_release")]
    pub release: f64,
}

impl EnvelopeConfig {
    fn default_gain() -> f32 {
        0.8
    }

    fn default_attack() -> f64 {
        0.005
    }

    fn default_decay() -> f64 {
        0.1
    }

    fn default_sustain() -> f32 {
        0.7
    }

    fn default_release() -> f64 {
        0.3
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            gain: Self::default_gain(),
            attack: Self::default_attack(),
            decay: Self::default_decay(),
            sustain: Self::default_sustain(),
            release: Self::default_release(),
        }
    }
}
