//! Lexer (tokenizer) for filter expressions.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A location in the filter text.
///
/// `line` is 1-based, `column` is the 0-based character offset within the
/// line, and `offset` is the byte offset from the start of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    /// Byte offset from the start of the input.
    pub offset: usize,
    /// Line number (1-based).
    pub line: usize,
    /// Character column within the line (0-based).
    pub column: usize,
}

impl Position {
    /// Position of the first character of the input.
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 0,
    };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Error encountered during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A character that does not start any token.
    #[error("Line: {position}, Error: token recognition error at: '{character}'")]
    UnexpectedCharacter {
        /// The character that could not be tokenized.
        character: char,
        /// Where the character occurred.
        position: Position,
    },

    /// A quoted string without its closing delimiter on the same line.
    #[error("Line: {position}, Error: unterminated string literal")]
    UnterminatedString {
        /// Where the literal started.
        position: Position,
    },
}

impl LexError {
    /// Returns the position where the error occurred.
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::UnterminatedString { position } => *position,
        }
    }
}

/// The kind of a token in a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // ==================== Keywords ====================
    /// `WHERE` / `where`
    Where,
    /// `AND` / `and` / `&&`
    And,
    /// `OR` / `or` / `||`
    Or,
    /// `IN` / `in`
    In,
    /// `NIN` / `nin`
    Nin,
    /// `NOT` / `not`
    Not,

    // ==================== Punctuation ====================
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,

    // ==================== Operators ====================
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `-`
    Minus,
    /// `+`
    Plus,

    // ==================== Literals ====================
    /// `TRUE` / `true` / `FALSE` / `false`
    Bool,
    /// A single- or double-quoted string, delimiters included in the lexeme.
    QuotedString,
    /// A run of decimal digits.
    Integer,
    /// Two digit runs joined by a single `.`.
    Decimal,
    /// `[A-Za-z_][A-Za-z0-9_]*` that is not a keyword.
    Identifier,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Human-readable name used in "expecting ..." diagnostics.
    pub fn display_name(self) -> &'static str {
        match self {
            TokenKind::Where => "WHERE",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::In => "IN",
            TokenKind::Nin => "NIN",
            TokenKind::Not => "NOT",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Equals => "'=='",
            TokenKind::NotEquals => "'!='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Minus => "'-'",
            TokenKind::Plus => "'+'",
            TokenKind::Bool => "BOOLEAN_VALUE",
            TokenKind::QuotedString => "QUOTED_STRING",
            TokenKind::Integer => "INTEGER_VALUE",
            TokenKind::Decimal => "DECIMAL_VALUE",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Eof => "<EOF>",
        }
    }

    /// Returns true for the six comparison operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::Lt
                | TokenKind::Le
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A token with its source text and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The exact source text of the token (empty for `Eof`).
    pub lexeme: String,
    /// Where the token starts.
    pub position: Position,
}

impl Token {
    /// The token text as shown in diagnostics (`<EOF>` at end of input).
    pub fn text(&self) -> &str {
        if self.kind == TokenKind::Eof {
            "<EOF>"
        } else {
            &self.lexeme
        }
    }
}

/// Maps an identifier-shaped word to its keyword kind.
///
/// Keywords are case-sensitive: only the all-upper and all-lower spellings
/// are reserved, anything else (`And`, `True`) stays an identifier.
fn keyword(word: &str) -> Option<TokenKind> {
    match word {
        "WHERE" | "where" => Some(TokenKind::Where),
        "AND" | "and" => Some(TokenKind::And),
        "OR" | "or" => Some(TokenKind::Or),
        "IN" | "in" => Some(TokenKind::In),
        "NIN" | "nin" => Some(TokenKind::Nin),
        "NOT" | "not" => Some(TokenKind::Not),
        "TRUE" | "true" | "FALSE" | "false" => Some(TokenKind::Bool),
        _ => None,
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Lazy, single-pass tokenizer for filter expressions.
///
/// Yields `Ok(Token)` for every token, a final `Eof` token, and then stops.
/// After a `LexError` is yielded the lexer is exhausted.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte offset in `input`.
    offset: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
            column: 0,
            finished: false,
        }
    }

    fn current_position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.offset..].chars().nth(1)
    }

    /// Consumes and returns the next character, updating line and column.
    fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next_char();
        }
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.next_char();
        }
    }

    fn token(&self, kind: TokenKind, start: Position) -> Token {
        Token {
            kind,
            lexeme: self.input[start.offset..self.offset].to_string(),
            position: start,
        }
    }

    /// Consumes one character and emits `kind`, or two characters when the
    /// second one is `follow` and emits `long_kind`.
    fn one_or_two(
        &mut self,
        start: Position,
        kind: TokenKind,
        follow: char,
        long_kind: TokenKind,
    ) -> Token {
        self.next_char();
        if self.peek() == Some(follow) {
            self.next_char();
            self.token(long_kind, start)
        } else {
            self.token(kind, start)
        }
    }

    /// Requires `first` to be followed by `second` (`==`, `!=`, `&&`, `||`).
    fn pair(
        &mut self,
        start: Position,
        first: char,
        second: char,
        kind: TokenKind,
    ) -> Result<Token, LexError> {
        self.next_char();
        if self.peek() == Some(second) {
            self.next_char();
            Ok(self.token(kind, start))
        } else {
            Err(LexError::UnexpectedCharacter {
                character: first,
                position: start,
            })
        }
    }

    /// Reads a quoted string; a backslash escapes the following character.
    fn read_quoted_string(&mut self, start: Position, quote: char) -> Result<Token, LexError> {
        self.next_char(); // opening quote
        loop {
            match self.next_char() {
                None | Some('\n') | Some('\r') => {
                    return Err(LexError::UnterminatedString { position: start });
                }
                Some('\\') => {
                    if matches!(self.peek(), None | Some('\n') | Some('\r')) {
                        return Err(LexError::UnterminatedString { position: start });
                    }
                    self.next_char();
                }
                Some(c) if c == quote => return Ok(self.token(TokenKind::QuotedString, start)),
                Some(_) => {}
            }
        }
    }

    /// Reads `123`, `1.5`, `1.` or `.5`. A number never contains a second `.`.
    fn read_number(&mut self, start: Position) -> Token {
        self.consume_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.next_char();
            self.consume_while(|c| c.is_ascii_digit());
            self.token(TokenKind::Decimal, start)
        } else {
            self.token(TokenKind::Integer, start)
        }
    }

    fn read_word(&mut self, start: Position) -> Token {
        self.consume_while(is_identifier_continue);
        let word = &self.input[start.offset..self.offset];
        let kind = keyword(word).unwrap_or(TokenKind::Identifier);
        self.token(kind, start)
    }

    /// Returns the next token, or an error for input that is not a token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.current_position();

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                position: start,
            });
        };

        let single = |lexer: &mut Self, kind| {
            lexer.next_char();
            Ok(lexer.token(kind, start))
        };

        match c {
            '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                Ok(self.read_number(start))
            }
            '.' => single(self, TokenKind::Dot),
            ',' => single(self, TokenKind::Comma),
            '[' => single(self, TokenKind::LeftBracket),
            ']' => single(self, TokenKind::RightBracket),
            '(' => single(self, TokenKind::LeftParen),
            ')' => single(self, TokenKind::RightParen),
            '-' => single(self, TokenKind::Minus),
            '+' => single(self, TokenKind::Plus),
            '>' => Ok(self.one_or_two(start, TokenKind::Gt, '=', TokenKind::Ge)),
            '<' => Ok(self.one_or_two(start, TokenKind::Lt, '=', TokenKind::Le)),
            '=' => self.pair(start, '=', '=', TokenKind::Equals),
            '!' => self.pair(start, '!', '=', TokenKind::NotEquals),
            '&' => self.pair(start, '&', '&', TokenKind::And),
            '|' => self.pair(start, '|', '|', TokenKind::Or),
            '\'' | '"' => self.read_quoted_string(start, c),
            _ if c.is_ascii_digit() => Ok(self.read_number(start)),
            _ if is_identifier_start(c) => Ok(self.read_word(start)),
            _ => Err(LexError::UnexpectedCharacter {
                character: c,
                position: start,
            }),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.kind == TokenKind::Eof => self.finished = true,
            Err(_) => self.finished = true,
            Ok(token) => log::trace!("token {:?} {:?} at {}", token.kind, token.lexeme, token.position),
        }
        Some(result)
    }
}

/// Tokenizes `input` lazily.
///
/// # Example
///
/// ```
/// use vecfilter::filter::{tokenize, TokenKind};
///
/// let kinds: Vec<TokenKind> = tokenize("year >= 2020")
///     .map(|t| t.unwrap().kind)
///     .collect();
/// assert_eq!(
///     kinds,
///     vec![TokenKind::Identifier, TokenKind::Ge, TokenKind::Integer, TokenKind::Eof]
/// );
/// ```
pub fn tokenize(input: &str) -> Lexer<'_> {
    Lexer::new(input)
}
