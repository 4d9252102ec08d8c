//! Things the scheduler can play: resolved tab positions and instrument
//! note events.

use serde::{Deserialize, Serialize};
use tracing::warn;

use asciitab::{TimeSlice, Tuning, MIDI_MAX};

use crate::duration::{NoteLength, TAB_STEP_CODE};
use crate::error::PlaybackError;

/// A group of pitches that start together and how long they last.
pub trait PlayableUnit: Send + Sync {
    /// Pitches in trigger order. Empty means a rest.
    fn pitches(&self) -> &[u8];

    fn length(&self) -> NoteLength;

    /// MIDI velocity, if the unit carries one.
    fn velocity(&self) -> Option<u8> {
        None
    }

    fn articulation(&self) -> Option<&str> {
        None
    }
}

/// A tab time slice resolved to MIDI pitches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStep {
    pub index: usize,
    pub pitches: Vec<u8>,
}

impl TabStep {
    /// Resolve a slice. Notes that land above MIDI 127 are dropped.
    pub fn from_slice(slice: &TimeSlice, tuning: &Tuning) -> Self {
        let pitches = slice
            .notes
            .iter()
            .filter_map(|note| {
                let pitch = tuning.pitch_of(note);
                if pitch.is_none() {
                    warn!(
                        string = %note.string,
                        fret = note.fret,
                        "Fret above MIDI {}, dropped",
                        MIDI_MAX
                    );
                }
                pitch
            })
            .collect();

        TabStep {
            index: slice.index,
            pitches,
        }
    }
}

impl PlayableUnit for TabStep {
    fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    fn length(&self) -> NoteLength {
        NoteLength::Code(TAB_STEP_CODE)
    }
}

/// Resolve a whole parsed tab.
pub fn tab_steps(slices: &[TimeSlice], tuning: &Tuning) -> Vec<TabStep> {
    slices
        .iter()
        .map(|slice| TabStep::from_slice(slice, tuning))
        .collect()
}

/// One instrument note event as produced by the generation API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    #[serde(alias = "notes")]
    pub pitches: Vec<u8>,
    /// Divisor of a whole note: 1 whole, 4 quarter, 8 eighth.
    pub duration: u32,
    #[serde(default = "NoteEvent::default_velocity")]
    pub velocity: u8,
    #[serde(default)]
    pub articulation: String,
}

impl NoteEvent {
    fn default_velocity() -> u8 {
        100
    }

    pub fn new(pitches: Vec<u8>, duration: u32) -> Self {
        NoteEvent {
            pitches,
            duration,
            velocity: Self::default_velocity(),
            articulation: String::new(),
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_articulation(mut self, articulation: impl Into<String>) -> Self {
        self.articulation = articulation.into();
        self
    }

    /// Check the event against the input contract. `index` is only used
    /// for the error.
    pub fn validate(&self, index: usize) -> Result<(), PlaybackError> {
        let invalid = |reason: String| PlaybackError::InvalidEvent { index, reason };

        if self.pitches.is_empty() {
            return Err(invalid("no pitches".to_string()));
        }
        if let Some(p) = self.pitches.iter().find(|&&p| p > MIDI_MAX) {
            return Err(invalid(format!("pitch {} is outside 0-127", p)));
        }
        if self.duration == 0 {
            return Err(invalid("duration code must be at least 1".to_string()));
        }
        if self.velocity > MIDI_MAX {
            return Err(invalid(format!("velocity {} is outside 0-127", self.velocity)));
        }
        Ok(())
    }
}

impl PlayableUnit for NoteEvent {
    fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    fn length(&self) -> NoteLength {
        NoteLength::Code(self.duration)
    }

    fn velocity(&self) -> Option<u8> {
        Some(self.velocity)
    }

    fn articulation(&self) -> Option<&str> {
        if self.articulation.is_empty() {
            None
        } else {
            Some(&self.articulation)
        }
    }
}

/// Decode and validate a JSON array of note events.
pub fn events_from_json(json: &str) -> Result<Vec<NoteEvent>, PlaybackError> {
    let events: Vec<NoteEvent> = serde_json::from_str(json)?;
    for (index, event) in events.iter().enumerate() {
        event.validate(index)?;
    }
    Ok(events)
}
