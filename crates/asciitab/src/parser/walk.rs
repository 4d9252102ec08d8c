//! Column walk over the six content runs.
//!
//! All strings share one cursor. The scan length is the high `e` line's
//! content length; anything further right on other strings is never read.

use crate::ast::{FretNote, StringId, TimeSlice};

/// A fret number read at a column and how many characters it occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FretToken {
    pub fret: u8,
    pub width: usize,
}

/// Read a one- or two-digit fret starting at `column`.
pub fn fret_token(content: &[u8], column: usize) -> Option<FretToken> {
    let first = *content.get(column)?;
    if !first.is_ascii_digit() {
        return None;
    }

    let tens = first - b'0';
    match content.get(column + 1) {
        Some(&next) if next.is_ascii_digit() => Some(FretToken {
            fret: tens * 10 + (next - b'0'),
            width: 2,
        }),
        _ => Some(FretToken { fret: tens, width: 1 }),
    }
}

/// Walk the runs (given in canonical order) and collect time slices.
///
/// After each column the shared cursor advances by the widest token read
/// there, so the second digit of `12` is never taken as a new note.
pub fn walk_columns(runs: &[(StringId, &[u8])]) -> Vec<TimeSlice> {
    let scan_len = runs
        .iter()
        .find(|(string, _)| *string == StringId::HighE)
        .map(|(_, content)| content.len())
        .unwrap_or(0);

    let mut slices = Vec::new();
    let mut column = 0;

    while column < scan_len {
        let mut notes = Vec::new();
        let mut width = 1;

        for (string, content) in runs {
            if let Some(token) = fret_token(content, column) {
                notes.push(FretNote::new(*string, token.fret));
                width = width.max(token.width);
            }
        }

        if !notes.is_empty() {
            slices.push(TimeSlice {
                index: slices.len(),
                column,
                notes,
            });
        }

        column += width;
    }

    slices
}
