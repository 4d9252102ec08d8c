//! Six-string ASCII guitar tab parser.
//!
//! Turns text like
//!
//! ```text
//! e|--0--2--|
//! B|--3-----|
//! G|-------|
//! D|-------|
//! A|-------|
//! E|-------|
//! ```
//!
//! into an ordered sequence of [`TimeSlice`]s, each holding the notes that
//! sound together at one column.
//!
//! # Example
//!
//! ```
//! use asciitab::{parse, StringId, Tuning};
//!
//! let tab = "e|--0--2--|\nB|--3-----|\nG|-------|\nD|-------|\nA|-------|\nE|-------|";
//! let slices = parse(tab);
//!
//! assert_eq!(slices.len(), 2);
//! assert_eq!(slices[0].fret_on(StringId::B), Some(3));
//!
//! let pitch = Tuning::standard().pitch_of(&slices[0].notes[0]);
//! assert_eq!(pitch, Some(64));
//! ```
//!
//! Malformed input is not an error: anything without exactly six distinct
//! string lines parses to an empty sequence. Use [`parse_with_feedback`]
//! to find out why.

pub mod ast;
pub mod feedback;
pub mod parser;
pub mod tuning;

pub use ast::*;
pub use feedback::{Feedback, FeedbackLevel, ParseResult};
pub use parser::check::MAX_FRET;
pub use tuning::{PitchClass, Tuning, MIDI_MAX};

/// Parse tab text into time slices. Never fails; see the crate docs.
pub fn parse(input: &str) -> Vec<TimeSlice> {
    parser::parse(input)
}

/// Parse tab text, collecting structural diagnostics.
pub fn parse_with_feedback(input: &str) -> ParseResult<Vec<TimeSlice>> {
    parser::parse_with_feedback(input)
}

/// Total notes across a parsed tab.
pub fn note_count(slices: &[TimeSlice]) -> usize {
    slices.iter().map(|s| s.notes.len()).sum()
}
