//! Diagnostics about tab structure.
//!
//! Parsing never fails outright. A tab that cannot be played parses to
//! nothing, and the reasons (plus softer style problems) are reported here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// The tab is unplayable; parsing yielded no slices
    Error,
    /// Playable, but some notes may be dropped or misread
    Warning,
    /// Cosmetic
    Info,
}

/// A single diagnostic, anchored to a 1-based line and column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub suggestion: Option<String>,
}

impl Feedback {
    fn at(level: FeedbackLevel, message: impl Into<String>, line: usize, column: usize) -> Self {
        Feedback {
            level,
            message: message.into(),
            line,
            column,
            suggestion: None,
        }
    }

    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::at(FeedbackLevel::Error, message, line, column)
    }

    pub fn warning(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::at(FeedbackLevel::Warning, message, line, column)
    }

    pub fn info(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::at(FeedbackLevel::Info, message, line, column)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Accumulates feedback while walking the tab.
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: Vec<Feedback>,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feedback: Feedback) {
        self.feedback.push(feedback);
    }

    pub fn has_errors(&self) -> bool {
        self.feedback.iter().any(|f| f.level == FeedbackLevel::Error)
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }

    pub fn into_feedback(self) -> Vec<Feedback> {
        self.feedback
    }
}

/// A parsed value together with the diagnostics produced along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult<T> {
    pub value: T,
    pub feedback: Vec<Feedback>,
}

impl<T> ParseResult<T> {
    pub fn new(value: T, feedback: Vec<Feedback>) -> Self {
        ParseResult { value, feedback }
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Feedback> {
        self.by_level(FeedbackLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.by_level(FeedbackLevel::Warning)
    }

    fn by_level(&self, level: FeedbackLevel) -> impl Iterator<Item = &Feedback> {
        self.feedback.iter().filter(move |f| f.level == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_attaches() {
        let fb = Feedback::warning("fret 27 is past the 24th fret", 3, 9)
            .with_suggestion("check the generator output");

        assert_eq!(fb.level, FeedbackLevel::Warning);
        assert_eq!((fb.line, fb.column), (3, 9));
        assert_eq!(fb.suggestion.as_deref(), Some("check the generator output"));
    }

    #[test]
    fn test_collector_tracks_errors() {
        let mut collector = FeedbackCollector::new();
        collector.push(Feedback::info("bar counts differ", 1, 1));
        assert!(!collector.has_errors());

        collector.push(Feedback::error("expected 6 strings, got 5", 1, 1));
        assert!(collector.has_errors());
        assert_eq!(collector.feedback().len(), 2);
    }

    #[test]
    fn test_result_filters_by_level() {
        let result = ParseResult::new(
            (),
            vec![
                Feedback::warning("w", 1, 1),
                Feedback::error("e", 2, 1),
                Feedback::info("i", 3, 1),
            ],
        );

        assert!(result.has_errors());
        assert_eq!(result.errors().count(), 1);
        assert_eq!(result.warnings().count(), 1);
    }
}
