//! Open-string pitches and fret-to-pitch conversion.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::{FretNote, StringId};

/// Highest valid MIDI note number.
pub const MIDI_MAX: u8 = 127;

/// Pitch class names, sharps only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    pub fn of_midi(pitch: u8) -> Self {
        Self::ALL[(pitch % 12) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Open-string MIDI pitches, indexed by canonical string position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    open: [u8; 6],
}

impl Tuning {
    /// Build from open pitches listed high e first.
    pub fn new(open: [u8; 6]) -> Self {
        Tuning { open }
    }

    /// E2 A2 D3 G3 B3 E4
    pub fn standard() -> Self {
        Tuning::new([64, 59, 55, 50, 45, 40])
    }

    pub fn open_pitch(&self, string: StringId) -> u8 {
        self.open[string.position()]
    }

    /// MIDI pitch of a fretted note, `None` if it lands above 127.
    pub fn pitch(&self, string: StringId, fret: u8) -> Option<u8> {
        self.open_pitch(string)
            .checked_add(fret)
            .filter(|p| *p <= MIDI_MAX)
    }

    pub fn pitch_of(&self, note: &FretNote) -> Option<u8> {
        self.pitch(note.string, note.fret)
    }

    pub fn note_name(&self, string: StringId, fret: u8) -> Option<PitchClass> {
        self.pitch(string, fret).map(PitchClass::of_midi)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning::standard()
    }
}
