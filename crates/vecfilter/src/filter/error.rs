//! Error types for the filter parser.

use std::fmt;

use thiserror::Error;

use super::lexer::{LexError, Position, Token, TokenKind};

/// A specialized Result type for filter parsing operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur during filter parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// The text contains something that is not a token.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The tokens do not form a valid filter.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Parentheses or boolean operators are nested deeper than the parser allows.
    #[error("Line: {position}, Error: filter is nested too deeply (maximum depth {limit})")]
    TooDeep {
        /// The maximum supported nesting depth.
        limit: usize,
        /// Where the limit was exceeded.
        position: Position,
    },

    /// The filter chains more predicates than the parser allows.
    #[error("Line: {position}, Error: filter is too large (maximum tree height {limit})")]
    TooLarge {
        /// The maximum supported tree height.
        limit: usize,
        /// Where the limit was exceeded.
        position: Position,
    },
}

impl FilterError {
    /// Creates a nesting-depth error.
    pub fn too_deep(limit: usize, position: Position) -> Self {
        FilterError::TooDeep { limit, position }
    }

    /// Creates a tree-height error.
    pub fn too_large(limit: usize, position: Position) -> Self {
        FilterError::TooLarge { limit, position }
    }

    /// Returns the position the error refers to, if any.
    pub fn position(&self) -> Option<Position> {
        match self {
            FilterError::EmptyExpression => None,
            FilterError::Lex(e) => Some(e.position()),
            FilterError::Parse(e) => Some(e.position),
            FilterError::TooDeep { position, .. } | FilterError::TooLarge { position, .. } => {
                Some(*position)
            }
        }
    }
}

/// Why a token sequence was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorReason {
    /// No grammar alternative starts with the offending token.
    NoViableAlternative,
    /// One of a specific set of tokens was required.
    MismatchedInput,
    /// A quoted key with no characters.
    EmptyKey,
    /// A numeric literal that does not fit the value type.
    NumberOutOfRange,
}

/// A malformed token sequence, with the offending token and what was expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Why the input was rejected.
    pub reason: ParseErrorReason,
    /// Where the offending token starts.
    pub position: Position,
    /// The offending token's text (`<EOF>` at end of input).
    pub found: String,
    /// Descriptions of the tokens that would have been accepted.
    pub expected: Vec<String>,
}

impl ParseError {
    fn new(reason: ParseErrorReason, token: &Token, expected: &[TokenKind]) -> Self {
        Self {
            reason,
            position: token.position,
            found: token.text().to_string(),
            expected: expected
                .iter()
                .map(|k| k.display_name().to_string())
                .collect(),
        }
    }

    /// No alternative of the current rule accepts `token`.
    pub fn no_viable_alternative(token: &Token, expected: &[TokenKind]) -> Self {
        Self::new(ParseErrorReason::NoViableAlternative, token, expected)
    }

    /// `token` is not one of the `expected` kinds.
    pub fn mismatched(token: &Token, expected: &[TokenKind]) -> Self {
        Self::new(ParseErrorReason::MismatchedInput, token, expected)
    }

    /// `token` is a quoted key with nothing between its delimiters.
    pub fn empty_key(token: &Token) -> Self {
        Self::new(ParseErrorReason::EmptyKey, token, &[])
    }

    /// `token` is a number outside the representable range.
    pub fn number_out_of_range(token: &Token, literal: impl Into<String>) -> Self {
        Self {
            reason: ParseErrorReason::NumberOutOfRange,
            position: token.position,
            found: literal.into(),
            expected: Vec::new(),
        }
    }

    /// The message without the `Line: l:c` prefix.
    pub fn message(&self) -> String {
        match self.reason {
            ParseErrorReason::NoViableAlternative => {
                format!("no viable alternative at input '{}'", self.found)
            }
            ParseErrorReason::MismatchedInput => format!(
                "mismatched input '{}' expecting {}",
                self.found,
                expected_set(&self.expected)
            ),
            ParseErrorReason::EmptyKey => format!("empty key at input '{}'", self.found),
            ParseErrorReason::NumberOutOfRange => {
                format!("number out of range at input '{}'", self.found)
            }
        }
    }
}

/// Formats an expected-token set: a single entry bare, several in braces.
fn expected_set(expected: &[String]) -> String {
    match expected {
        [single] => single.clone(),
        many => format!("{{{}}}", many.join(", ")),
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line: {}, Error: {}", self.position, self.message())
    }
}

impl std::error::Error for ParseError {}
