//! Musical time to wall-clock time.
//!
//! A beat is a quarter note. Duration codes divide a whole note:
//! 1 = whole (4 beats), 4 = quarter (1 beat), 8 = eighth, and so on.
//! Tab playback has no per-note lengths and steps in eighth notes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::PlaybackError;

/// Beats in a whole note.
const WHOLE_NOTE_BEATS: f64 = 4.0;

/// Tab positions are played as eighth notes.
pub const TAB_STEP_CODE: u32 = 8;

/// A validated tempo: finite and strictly positive BPM.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tempo(f64);

impl Tempo {
    pub fn new(bpm: f64) -> Result<Self, PlaybackError> {
        if bpm.is_finite() && bpm > 0.0 {
            Ok(Tempo(bpm))
        } else {
            Err(PlaybackError::InvalidTempo(bpm))
        }
    }

    pub fn bpm(self) -> f64 {
        self.0
    }

    /// Length of one beat in seconds.
    pub fn beat_seconds(self) -> f64 {
        60.0 / self.0
    }
}

impl TryFrom<f64> for Tempo {
    type Error = PlaybackError;

    fn try_from(bpm: f64) -> Result<Self, Self::Error> {
        Tempo::new(bpm)
    }
}

impl From<Tempo> for f64 {
    fn from(tempo: Tempo) -> f64 {
        tempo.0
    }
}

/// How long a unit lasts: a duration code or an explicit number of seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteLength {
    Code(u32),
    Seconds(f64),
}

impl NoteLength {
    /// Reject lengths that cannot be scheduled.
    pub fn validate(self) -> Result<(), PlaybackError> {
        match self {
            NoteLength::Code(0) => Err(PlaybackError::InvalidDuration(
                "duration code must be at least 1".to_string(),
            )),
            NoteLength::Seconds(s) if !(s.is_finite() && s > 0.0) => Err(
                PlaybackError::InvalidDuration(format!("{} is not a positive number of seconds", s)),
            ),
            _ => Ok(()),
        }
    }

    /// Wall-clock seconds at `tempo`.
    pub fn seconds(self, tempo: Tempo) -> Result<f64, PlaybackError> {
        self.validate()?;
        Ok(match self {
            NoteLength::Code(code) => (WHOLE_NOTE_BEATS / code as f64) * tempo.beat_seconds(),
            NoteLength::Seconds(s) => s,
        })
    }

    /// Wall-clock length at `tempo`. Lengths too long to represent are
    /// rejected rather than clamped.
    pub fn duration(self, tempo: Tempo) -> Result<Duration, PlaybackError> {
        let seconds = self.seconds(tempo)?;
        Duration::try_from_secs_f64(seconds).map_err(|e| {
            PlaybackError::InvalidDuration(format!("{} seconds cannot be scheduled: {}", seconds, e))
        })
    }
}

/// Seconds for a duration code at a raw BPM value.
///
/// ```
/// use fretplay::seconds_for;
///
/// assert_eq!(seconds_for(4, 120.0).unwrap(), 0.5);
/// assert_eq!(seconds_for(1, 120.0).unwrap(), 2.0);
/// assert!(seconds_for(4, 0.0).is_err());
/// ```
pub fn seconds_for(code: u32, tempo_bpm: f64) -> Result<f64, PlaybackError> {
    NoteLength::Code(code).seconds(Tempo::new(tempo_bpm)?)
}

/// Seconds per tab position: half a beat.
pub fn tab_step_seconds(tempo_bpm: f64) -> Result<f64, PlaybackError> {
    Ok(Tempo::new(tempo_bpm)?.beat_seconds() / 2.0)
}
