//! Types produced by the tab parser.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the six guitar strings, named by its tab label.
///
/// Declaration order is the canonical top-to-bottom order of a tab:
/// high `e` first, low `E` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StringId {
    /// `e` - first string, highest pitch
    HighE,
    B,
    G,
    D,
    A,
    /// `E` - sixth string, lowest pitch
    LowE,
}

impl StringId {
    /// All strings in canonical tab order (high to low).
    pub const ALL: [StringId; 6] = [
        StringId::HighE,
        StringId::B,
        StringId::G,
        StringId::D,
        StringId::A,
        StringId::LowE,
    ];

    /// Look up a string by its single-character tab label.
    pub fn from_label(label: char) -> Option<Self> {
        match label {
            'e' => Some(StringId::HighE),
            'B' => Some(StringId::B),
            'G' => Some(StringId::G),
            'D' => Some(StringId::D),
            'A' => Some(StringId::A),
            'E' => Some(StringId::LowE),
            _ => None,
        }
    }

    pub fn label(self) -> char {
        match self {
            StringId::HighE => 'e',
            StringId::B => 'B',
            StringId::G => 'G',
            StringId::D => 'D',
            StringId::A => 'A',
            StringId::LowE => 'E',
        }
    }

    /// Position in canonical order (0 = high e).
    pub fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown string label '{0}' (expected one of e B G D A E)")]
pub struct UnknownString(pub char);

impl TryFrom<char> for StringId {
    type Error = UnknownString;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        StringId::from_label(c).ok_or(UnknownString(c))
    }
}

/// A fretted note: which string, which fret.
///
/// Frets are not range-checked; values above 24 are an upstream
/// producer problem and are only flagged by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FretNote {
    pub string: StringId,
    pub fret: u8,
}

impl FretNote {
    pub fn new(string: StringId, fret: u8) -> Self {
        FretNote { string, fret }
    }
}

/// Notes that sound together at one position of the tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlice {
    /// Ordinal time index. Only positions holding notes consume an index.
    pub index: usize,
    /// Character column within the content runs (0 = first char after `|`)
    pub column: usize,
    /// Notes in canonical string order (high e first)
    pub notes: Vec<FretNote>,
}

impl TimeSlice {
    pub fn is_chord(&self) -> bool {
        self.notes.len() > 1
    }

    pub fn fret_on(&self, string: StringId) -> Option<u8> {
        self.notes
            .iter()
            .find(|n| n.string == string)
            .map(|n| n.fret)
    }
}

/// A recognized `<label>|<content>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLine<'a> {
    pub string: StringId,
    /// Everything after the first `|`, surrounding whitespace removed
    pub content: &'a str,
    /// Byte offset of `content` within its source line
    pub offset: usize,
    /// 1-based line number in the source text
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_in_canonical_order() {
        let labels: String = StringId::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, "eBGDAE");
        for s in StringId::ALL {
            assert_eq!(StringId::from_label(s.label()), Some(s));
        }
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(StringId::try_from('x'), Err(UnknownString('x')));
        assert_eq!(StringId::from_label('b'), None);
    }

    #[test]
    fn test_time_slice_fret_lookup() {
        let slice = TimeSlice {
            index: 0,
            column: 2,
            notes: vec![FretNote::new(StringId::HighE, 0), FretNote::new(StringId::B, 3)],
        };
        assert!(slice.is_chord());
        assert_eq!(slice.fret_on(StringId::B), Some(3));
        assert_eq!(slice.fret_on(StringId::G), None);
    }
}
