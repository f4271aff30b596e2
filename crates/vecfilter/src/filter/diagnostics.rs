//! Human-readable reports for filter errors.
//!
//! [`Diagnostic`] turns a [`FilterError`] into a message with the offending
//! line, a caret under the offending column, the accepted tokens, and a hint
//! when the offending word looks like a misspelled keyword or an unquoted
//! string.

use std::fmt;

use serde::Serialize;
use strsim::levenshtein;

use super::error::{FilterError, ParseErrorReason};
use super::lexer::Position;
use super::parser::normalize;

/// Maximum Levenshtein distance to consider a keyword as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Finds the keyword closest to `word` among the expected token names.
///
/// Only bare keyword names (`IN`, `AND`, ...) are candidates; punctuation and
/// literal classes are skipped.
fn find_similar_keyword<'a>(word: &str, expected: &'a [String]) -> Option<&'a str> {
    let upper = word.to_uppercase();
    let (best, distance) = expected
        .iter()
        .map(String::as_str)
        .filter(|name| matches!(*name, "AND" | "OR" | "IN" | "NIN" | "NOT" | "WHERE"))
        .map(|name| (name, levenshtein(&upper, name)))
        .min_by_key(|(_, d)| *d)?;

    if distance > 0 && distance <= MAX_SUGGESTION_DISTANCE {
        Some(best)
    } else {
        None
    }
}

fn is_bare_word(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A structured, printable report for a filter error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The error message (same text as the error's `Display`).
    pub message: String,
    /// Where the error occurred in the normalized filter text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// The source line containing the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
    /// Tokens that would have been accepted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected: Vec<String>,
    /// A suggestion for fixing the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Builds a diagnostic for `error`, which was produced by parsing `input`.
    pub fn from_error(error: &FilterError, input: &str) -> Self {
        let position = error.position();
        let source = normalize(input);
        let source_line = position.and_then(|p| source.lines().nth(p.line - 1).map(str::to_string));

        let (expected, hint) = match error {
            FilterError::Parse(e) => (e.expected.clone(), Self::hint_for(e.reason, &e.found, &e.expected)),
            FilterError::TooDeep { .. } => (
                Vec::new(),
                Some("remove redundant parentheses or split the filter".to_string()),
            ),
            FilterError::TooLarge { .. } => (
                Vec::new(),
                Some("use IN [...] instead of a long chain of == comparisons".to_string()),
            ),
            FilterError::EmptyExpression => (
                Vec::new(),
                Some("a filter looks like: country == 'BG' AND year >= 2020".to_string()),
            ),
            FilterError::Lex(_) => (Vec::new(), None),
        };

        Self {
            message: error.to_string(),
            position,
            source_line,
            expected,
            hint,
        }
    }

    fn hint_for(reason: ParseErrorReason, found: &str, expected: &[String]) -> Option<String> {
        if reason != ParseErrorReason::NoViableAlternative || !is_bare_word(found) {
            return None;
        }
        if let Some(keyword) = find_similar_keyword(found, expected) {
            return Some(format!("did you mean '{keyword}'?"));
        }
        if expected.iter().any(|e| e == "QUOTED_STRING") {
            return Some(format!("string values must be quoted, e.g. '{found}'"));
        }
        None
    }

    /// The caret line pointing at the error column, if there is a position.
    pub fn caret(&self) -> Option<String> {
        self.position
            .map(|p| format!("{}^", " ".repeat(p.column)))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let (Some(line), Some(caret)) = (&self.source_line, self.caret()) {
            write!(f, "\n  {line}\n  {caret}")?;
        }
        if !self.expected.is_empty() {
            write!(f, "\n  expected one of: {}", self.expected.join(", "))?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}
