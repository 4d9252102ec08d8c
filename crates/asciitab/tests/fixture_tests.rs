//! Fixture-based tests for tab parsing.
//!
//! Each .tab file in tests/fixtures/ is a well-formed, column-aligned tab.

use asciitab::{
    note_count, parse, parse_with_feedback, FretNote, PitchClass, StringId, TimeSlice, Tuning,
    MAX_FRET,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.tab", name));

    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e))
}

/// Count fret tokens line by line, independently of column alignment.
fn digit_tokens(text: &str) -> usize {
    text.lines()
        .filter_map(|line| line.trim().split_once('|'))
        .filter(|(label, _)| label.len() == 1 && "eBGDAE".contains(*label))
        .map(|(_, content)| {
            let bytes = content.as_bytes();
            let mut count = 0;
            let mut i = 0;
            while i < bytes.len() {
                if bytes[i].is_ascii_digit() {
                    count += 1;
                    if i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                        i += 1;
                    }
                }
                i += 1;
            }
            count
        })
        .sum()
}

fn check_fixture(name: &str, expected_slices: usize) -> Vec<TimeSlice> {
    let text = load_fixture(name);

    let result = parse_with_feedback(&text);
    assert!(
        !result.has_errors(),
        "Fixture {} had errors: {:?}",
        name,
        result.feedback
    );
    assert_eq!(
        result.warnings().count(),
        0,
        "Fixture {} had warnings: {:?}",
        name,
        result.feedback
    );

    let slices = result.value;
    assert_eq!(slices.len(), expected_slices, "slice count for {}", name);
    assert_eq!(note_count(&slices), digit_tokens(&text), "note count for {}", name);

    for (i, slice) in slices.iter().enumerate() {
        assert_eq!(slice.index, i);
        assert!(slice.notes.iter().all(|n| n.fret <= MAX_FRET));
    }

    slices
}

#[test]
fn test_fixture_a_minor_pentatonic() {
    let slices = check_fixture("a_minor_pentatonic", 12);

    let tuning = Tuning::standard();
    let scale: HashSet<PitchClass> = [
        PitchClass::A,
        PitchClass::C,
        PitchClass::D,
        PitchClass::E,
        PitchClass::G,
    ]
    .into_iter()
    .collect();

    for note in slices.iter().flat_map(|s| &s.notes) {
        let name = tuning.note_name(note.string, note.fret).unwrap();
        assert!(scale.contains(&name), "{:?} is {} which is outside A minor pentatonic", note, name);
    }

    // Ascending: each slice is strictly higher than the last
    let pitches: Vec<u8> = slices
        .iter()
        .map(|s| tuning.pitch_of(&s.notes[0]).unwrap())
        .collect();
    assert!(pitches.windows(2).all(|w| w[0] < w[1]), "{:?}", pitches);
}

#[test]
fn test_fixture_power_chords() {
    let slices = check_fixture("power_chords", 4);

    assert!(slices.iter().all(|s| s.notes.len() == 3));
    assert_eq!(slices[2].column, 10);
    assert_eq!(
        slices[2].notes,
        vec![
            FretNote::new(StringId::D, 12),
            FretNote::new(StringId::A, 12),
            FretNote::new(StringId::LowE, 10),
        ]
    );

    // Root, fifth, octave
    let tuning = Tuning::standard();
    let mut pitches: Vec<u8> = slices[0]
        .notes
        .iter()
        .filter_map(|n| tuning.pitch_of(n))
        .collect();
    pitches.sort_unstable();
    assert_eq!(pitches, vec![40, 47, 52]);
}

#[test]
fn test_fixture_two_bars() {
    let slices = check_fixture("two_bars", 7);

    let strings: Vec<StringId> = slices.iter().map(|s| s.notes[0].string).collect();
    assert_eq!(
        strings,
        vec![
            StringId::HighE,
            StringId::B,
            StringId::G,
            StringId::D,
            StringId::A,
            StringId::HighE,
            StringId::B,
        ]
    );
}

#[test]
fn test_fixture_upper_neck() {
    let slices = check_fixture("upper_neck", 4);

    assert_eq!(slices[0].fret_on(StringId::B), Some(13));
    assert_eq!(slices[1].fret_on(StringId::B), Some(17));
    assert_eq!(slices[2].fret_on(StringId::G), Some(14));
    assert_eq!(slices[3].fret_on(StringId::A), Some(9));
    assert_eq!(slices[3].column, 14);
}

#[test]
fn test_every_fixture_truncated_to_five_strings_is_empty() {
    for name in ["a_minor_pentatonic", "power_chords", "two_bars", "upper_neck"] {
        let text = load_fixture(name);
        let without_low_e: String = text
            .lines()
            .filter(|l| !l.starts_with("E|"))
            .collect::<Vec<_>>()
            .join("\n");

        assert!(parse(&without_low_e).is_empty(), "{} should not parse", name);
    }
}
