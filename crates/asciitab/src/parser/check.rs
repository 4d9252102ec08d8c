//! Structural checks that explain why a tab plays the way it does.

use std::collections::HashSet;

use crate::ast::{StringId, StringLine};
use crate::feedback::{Feedback, FeedbackCollector};

use super::walk::fret_token;

/// Highest fret on a standard 24-fret neck.
pub const MAX_FRET: u8 = 24;

/// Checks that make a tab unplayable. Emits an error exactly when
/// [`super::line::canonical`] would reject the lines.
pub fn check_structure(lines: &[StringLine<'_>], collector: &mut FeedbackCollector) {
    let first_line = lines.first().map(|l| l.line).unwrap_or(1);

    let mut seen = HashSet::new();
    for line in lines {
        if !seen.insert(line.string) {
            collector.push(Feedback::error(
                format!("string '{}' appears more than once", line.string),
                line.line,
                1,
            ));
        }
    }

    if lines.len() != StringId::ALL.len() {
        collector.push(
            Feedback::error(
                format!("expected 6 string lines, found {}", lines.len()),
                first_line,
                1,
            )
            .with_suggestion("a tab needs one line per string: e B G D A E"),
        );
    } else if seen.len() != StringId::ALL.len() {
        let missing: String = StringId::ALL
            .iter()
            .filter(|s| !seen.contains(*s))
            .map(|s| s.label())
            .collect();
        collector.push(Feedback::error(
            format!("missing string(s): {}", missing),
            first_line,
            1,
        ));
    }
}

/// Softer checks on a tab that will play.
pub fn check_content(lines: &[StringLine<'_>], collector: &mut FeedbackCollector) {
    check_order(lines, collector);
    check_lengths(lines, collector);

    for line in lines {
        check_characters(line, collector);
        check_fret_range(line, collector);
    }

    check_bars(lines, collector);
}

fn check_order(lines: &[StringLine<'_>], collector: &mut FeedbackCollector) {
    let order: Vec<StringId> = lines.iter().map(|l| l.string).collect();
    if order != StringId::ALL {
        let found: String = order.iter().map(|s| s.label()).collect();
        collector.push(
            Feedback::warning(
                format!("strings are in order {} instead of eBGDAE", found),
                lines.first().map(|l| l.line).unwrap_or(1),
                1,
            )
            .with_suggestion("list strings from high e down to low E"),
        );
    }
}

fn check_lengths(lines: &[StringLine<'_>], collector: &mut FeedbackCollector) {
    let Some(high) = lines.iter().find(|l| l.string == StringId::HighE) else {
        return;
    };
    let scan_len = high.content.len();

    for line in lines.iter().filter(|l| l.content.len() > scan_len) {
        collector.push(Feedback::warning(
            format!(
                "string '{}' is {} characters long but the e line is {}; columns past {} are not played",
                line.string,
                line.content.len(),
                scan_len,
                scan_len
            ),
            line.line,
            line.offset + scan_len + 1,
        ));
    }

    for line in lines.iter().filter(|l| l.content.len() < scan_len) {
        collector.push(Feedback::info(
            format!(
                "string '{}' is shorter than the e line ({} < {})",
                line.string,
                line.content.len(),
                scan_len
            ),
            line.line,
            line.offset + line.content.len() + 1,
        ));
    }
}

fn check_characters(line: &StringLine<'_>, collector: &mut FeedbackCollector) {
    let stray = line
        .content
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '-' || *c == '|'));

    if let Some((idx, c)) = stray {
        collector.push(Feedback::warning(
            format!("unexpected character '{}' on string '{}'", c, line.string),
            line.line,
            line.offset + idx + 1,
        ));
    }
}

fn check_fret_range(line: &StringLine<'_>, collector: &mut FeedbackCollector) {
    let bytes = line.content.as_bytes();
    let mut idx = 0;

    while idx < bytes.len() {
        match fret_token(bytes, idx) {
            Some(token) => {
                if token.fret > MAX_FRET {
                    collector.push(Feedback::warning(
                        format!("fret {} on string '{}' is past fret {}", token.fret, line.string, MAX_FRET),
                        line.line,
                        line.offset + idx + 1,
                    ));
                }
                idx += token.width;
            }
            None => idx += 1,
        }
    }
}

fn check_bars(lines: &[StringLine<'_>], collector: &mut FeedbackCollector) {
    let counts: Vec<usize> = lines
        .iter()
        .map(|l| l.content.matches('|').count())
        .collect();

    if counts.windows(2).any(|w| w[0] != w[1]) {
        collector.push(Feedback::info(
            format!("bar line counts differ across strings: {:?}", counts),
            lines.first().map(|l| l.line).unwrap_or(1),
            1,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackLevel;
    use crate::parser::line::string_lines;

    fn run(text: &str) -> Vec<Feedback> {
        let lines = string_lines(text);
        let mut collector = FeedbackCollector::new();
        check_structure(&lines, &mut collector);
        if !collector.has_errors() {
            check_content(&lines, &mut collector);
        }
        collector.into_feedback()
    }

    #[test]
    fn test_clean_tab_has_no_feedback() {
        let fb = run("e|--0--|\nB|--1--|\nG|--0--|\nD|--2--|\nA|--3--|\nE|-----|");
        assert!(fb.is_empty(), "{:?}", fb);
    }

    #[test]
    fn test_five_strings_is_an_error() {
        let fb = run("e|--0--|\nB|--1--|\nG|--0--|\nD|--2--|\nA|--3--|");
        assert_eq!(fb.len(), 1);
        assert_eq!(fb[0].level, FeedbackLevel::Error);
        assert!(fb[0].message.contains("found 5"));
    }

    #[test]
    fn test_duplicate_string_is_an_error() {
        let fb = run("e|-0-\nB|-0-\nB|-0-\nD|-0-\nA|-0-\nE|-0-");
        let errors: Vec<_> = fb.iter().filter(|f| f.level == FeedbackLevel::Error).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 3);
        assert!(errors[1].message.contains("missing string(s): G"));
    }

    #[test]
    fn test_fret_past_24_warns_at_its_column() {
        let fb = run("e|--27-\nB|-----\nG|-----\nD|-----\nA|-----\nE|-----");
        assert_eq!(fb.len(), 1);
        assert_eq!(fb[0].level, FeedbackLevel::Warning);
        assert_eq!(fb[0].column, 5);
        assert!(fb[0].message.contains("fret 27"));
    }

    #[test]
    fn test_long_lower_string_warns() {
        let fb = run("e|---\nB|-----3\nG|---\nD|---\nA|---\nE|---");
        assert!(fb
            .iter()
            .any(|f| f.level == FeedbackLevel::Warning && f.line == 2 && f.message.contains("not played")));
    }

    #[test]
    fn test_stray_characters_and_order() {
        let fb = run("B|-h-\ne|-0-\nG|-0-\nD|-0-\nA|-0-\nE|-0-");
        assert!(fb.iter().any(|f| f.message.contains("instead of eBGDAE")));
        assert!(fb.iter().any(|f| f.message.contains("unexpected character 'h'") && f.column == 4));
    }
}
