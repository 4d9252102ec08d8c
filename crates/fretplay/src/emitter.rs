//! The note-emission contract and a logging implementation.
//!
//! Synthesis lives outside this crate. A [`NoteEmitter`] only has to load a
//! voice, start a pitch at an offset with an envelope, and silence
//! everything on request.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use fretconf::EnvelopeConfig;

use crate::error::EmitError;
use crate::voice::VoiceId;

/// ADSR shape plus the length the note is held for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub duration: Duration,
    pub gain: f32,
    pub attack: Duration,
    pub decay: Duration,
    pub sustain: f32,
    pub release: Duration,
}

impl Envelope {
    /// Build from config with a zero hold time. Negative or non-finite
    /// times clamp to zero.
    pub fn from_config(config: &EnvelopeConfig) -> Self {
        Envelope {
            duration: Duration::ZERO,
            gain: config.gain.clamp(0.0, 1.0),
            attack: secs(config.attack),
            decay: secs(config.decay),
            sustain: config.sustain.clamp(0.0, 1.0),
            release: secs(config.release),
        }
    }

    pub fn held_for(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Scale gain by a MIDI velocity (0-127).
    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.gain *= f32::from(velocity.min(127)) / 127.0;
        self
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope::from_config(&EnvelopeConfig::default())
    }
}

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

/// One pitch to start, `at` after the onset of its unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike<'a> {
    pub pitch: u8,
    pub at: Duration,
    pub envelope: Envelope,
    pub articulation: Option<&'a str>,
}

/// A sounding note that can be cut short.
pub trait NoteHandle: Send + Sync {
    fn stop(&self);
}

/// Handle for emitters that do not track individual notes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedNote;

impl NoteHandle for DetachedNote {
    fn stop(&self) {}
}

/// Sound-producing capability driven by the scheduler.
#[async_trait]
pub trait NoteEmitter: Send + Sync {
    /// Load (or confirm loaded) a voice. Returns false if it cannot be used.
    async fn load_voice(&self, voice: &VoiceId) -> bool;

    /// Start one pitch.
    async fn trigger(&self, strike: Strike<'_>) -> Result<Box<dyn NoteHandle>, EmitError>;

    /// Stop every sounding note on every voice.
    async fn silence_all(&self);
}

/// Emitter that only logs. Useful for demos and for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEmitter;

#[async_trait]
impl NoteEmitter for LoggingEmitter {
    async fn load_voice(&self, voice: &VoiceId) -> bool {
        info!("Voice loaded: {}", voice);
        true
    }

    async fn trigger(&self, strike: Strike<'_>) -> Result<Box<dyn NoteHandle>, EmitError> {
        debug!(
            pitch = strike.pitch,
            at_ms = strike.at.as_millis() as u64,
            gain = strike.envelope.gain,
            hold_ms = strike.envelope.duration.as_millis() as u64,
            articulation = strike.articulation.unwrap_or("-"),
            "note on"
        );
        Ok(Box::new(DetachedNote))
    }

    async fn silence_all(&self) {
        debug!("all notes off");
    }
}
