//! Tab text parser.
//!
//! Lines are recognized with winnow, then the six content runs are walked
//! column by column with a shared cursor.

pub mod check;
pub mod line;
pub mod walk;

use crate::ast::{StringId, TimeSlice};
use crate::feedback::{FeedbackCollector, ParseResult};

/// Parse tab text into time slices.
///
/// Anything other than exactly six distinct string lines yields an empty
/// sequence rather than an error.
pub fn parse(input: &str) -> Vec<TimeSlice> {
    let lines = line::string_lines(input);
    match line::canonical(&lines) {
        Some(ordered) => {
            let runs: Vec<(StringId, &[u8])> = ordered
                .iter()
                .map(|l| (l.string, l.content.as_bytes()))
                .collect();
            walk::walk_columns(&runs)
        }
        None => Vec::new(),
    }
}

/// Parse tab text and report structural diagnostics alongside the slices.
pub fn parse_with_feedback(input: &str) -> ParseResult<Vec<TimeSlice>> {
    let lines = line::string_lines(input);
    let mut collector = FeedbackCollector::new();

    check::check_structure(&lines, &mut collector);
    if collector.has_errors() {
        return ParseResult::new(Vec::new(), collector.into_feedback());
    }

    check::check_content(&lines, &mut collector);
    ParseResult::new(parse(input), collector.into_feedback())
}
