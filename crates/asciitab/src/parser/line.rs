//! Recognizing `<label>|<content>` string lines with winnow.

use winnow::prelude::*;
use winnow::token::{any, rest};

use crate::ast::{StringId, StringLine};

type PResult<T> = winnow::ModalResult<T>;

fn label(input: &mut &str) -> PResult<StringId> {
    any.verify_map(StringId::from_label).parse_next(input)
}

fn content<'a>(input: &mut &'a str) -> PResult<&'a str> {
    rest.verify(|s: &str| !s.is_empty()).parse_next(input)
}

/// Parse the string label, the `|` delimiter and a non-empty content run.
fn string_line<'a>(input: &mut &'a str) -> PResult<(StringId, &'a str)> {
    (label, '|', content)
        .map(|(string, _, content)| (string, content))
        .parse_next(input)
}

/// Match a single source line. Banner and decoration lines yield `None`.
pub fn recognize(raw: &str, line: usize) -> Option<StringLine<'_>> {
    let trimmed = raw.trim();
    let lead = raw.len() - raw.trim_start().len();
    let mut input = trimmed;
    let (string, content) = string_line.parse_next(&mut input).ok()?;

    Some(StringLine {
        string,
        content,
        // label + delimiter are one byte each
        offset: lead + 2,
        line,
    })
}

/// Every recognized string line in source order.
pub fn string_lines(input: &str) -> Vec<StringLine<'_>> {
    input
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| recognize(raw, idx + 1))
        .collect()
}

/// The six lines in canonical order, or `None` unless exactly six distinct
/// strings were recognized.
pub fn canonical<'s, 'a>(lines: &'s [StringLine<'a>]) -> Option<Vec<&'s StringLine<'a>>> {
    if lines.len() != StringId::ALL.len() {
        return None;
    }

    let mut ordered: Vec<&StringLine<'a>> = lines.iter().collect();
    ordered.sort_by_key(|l| l.string);
    ordered.dedup_by_key(|l| l.string);

    (ordered.len() == StringId::ALL.len()).then_some(ordered)
}
