//! Recursive descent parser for filter expressions.

use std::borrow::Cow;

use super::ast::{CompareOp, Expr, Key, Value, ValueList};
use super::error::{FilterError, FilterResult, ParseError};
use super::lexer::{Lexer, Token, TokenKind};

/// Maximum nesting depth of a parsed filter.
///
/// Depth counts parenthesized groups and changes between `AND` and `OR` on
/// the path from the root to the deepest predicate. A run of the same
/// operator, such as `a == 1 OR b == 2 OR c == 3`, is one level however long
/// it is.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Maximum height of the parsed tree.
///
/// Operator chains fold into left-leaning trees, so a flat chain of `n`
/// predicates is `n` nodes tall. Tree code that recurses (clone, drop,
/// serialization) relies on this bound.
pub const MAX_TREE_HEIGHT: usize = 2048;

const PRIMARY_START: &[TokenKind] = &[
    TokenKind::LeftParen,
    TokenKind::Identifier,
    TokenKind::QuotedString,
];

const PREDICATE_START: &[TokenKind] = &[
    TokenKind::Equals,
    TokenKind::NotEquals,
    TokenKind::Gt,
    TokenKind::Ge,
    TokenKind::Lt,
    TokenKind::Le,
    TokenKind::In,
    TokenKind::Nin,
    TokenKind::Not,
];

const VALUE_START: &[TokenKind] = &[
    TokenKind::Minus,
    TokenKind::Plus,
    TokenKind::Integer,
    TokenKind::Decimal,
    TokenKind::QuotedString,
    TokenKind::Bool,
];

/// Prefixes `WHERE ` unless the text already starts with the keyword.
///
/// Positions in parse errors refer to the normalized text, so a filter such
/// as `country == NL` reports its offending token at column 17.
pub(crate) fn normalize(input: &str) -> Cow<'_, str> {
    let starts_with_where = matches!(
        Lexer::new(input).next_token(),
        Ok(Token {
            kind: TokenKind::Where,
            ..
        })
    );
    if starts_with_where {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("WHERE {input}"))
    }
}

/// Strips the delimiters of a quoted-string lexeme and resolves escapes.
///
/// `\\` and a backslash before the delimiter become the escaped character;
/// any other backslash is kept as written.
pub(crate) fn unquote(lexeme: &str) -> String {
    let Some(quote) = lexeme.chars().next() else {
        return String::new();
    };
    if lexeme.len() < 2 * quote.len_utf8() {
        return String::new();
    }
    let body = &lexeme[quote.len_utf8()..lexeme.len() - quote.len_utf8()];

    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped) if escaped == quote || escaped == '\\' => text.push(escaped),
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }
    text
}

/// `'O''Brien'` is two literals with no gap between them; the doubled
/// delimiter stands for one embedded delimiter. Literals separated by
/// whitespace, or using different delimiters, join without one.
fn abutting_delimiter(previous: &Token, next: &Token) -> Option<char> {
    let delimiter = previous.lexeme.chars().next()?;
    let touching = previous.position.offset + previous.lexeme.len() == next.position.offset;
    (touching && next.lexeme.starts_with(delimiter)).then_some(delimiter)
}

fn compare_op(kind: TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::Equals => Some(CompareOp::Eq),
        TokenKind::NotEquals => Some(CompareOp::Ne),
        TokenKind::Gt => Some(CompareOp::Gt),
        TokenKind::Ge => Some(CompareOp::Ge),
        TokenKind::Lt => Some(CompareOp::Lt),
        TokenKind::Le => Some(CompareOp::Le),
        _ => None,
    }
}

/// A parsed subtree with its nesting depth and tree height.
struct Node {
    expr: Expr,
    depth: usize,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self {
            expr,
            depth: 0,
            height: 1,
        }
    }
}

/// Parser for metadata filter expressions.
///
/// This parser implements a recursive descent parser for the filter grammar,
/// pulling tokens lazily from the [`Lexer`] with one token of lookahead.
///
/// # Grammar
///
/// ```text
/// where         ::= "WHERE" or_expr EOF        (WHERE is implied when absent)
/// or_expr       ::= and_expr (OR and_expr)*
/// and_expr      ::= primary (AND primary)*
/// primary       ::= "(" or_expr ")" | key predicate
/// predicate     ::= compare_op value
///                 | "IN" list | "NOT" "IN" list | "NIN" list
/// list          ::= "[" value ("," value)* "]"
/// key           ::= IDENTIFIER "." IDENTIFIER | IDENTIFIER | QUOTED_STRING
/// value         ::= [sign] INTEGER | [sign] DECIMAL | QUOTED_STRING+ | BOOLEAN
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. `AND` / `&&` - binary, left-associative
/// 2. `OR` / `||` - binary, left-associative
///
/// # Example
///
/// ```
/// use vecfilter::filter::{Expr, FilterParser};
///
/// let filter = FilterParser::parse("country == 'BG' && year == 2020").unwrap();
/// assert!(matches!(filter, Expr::And { .. }));
/// ```
pub struct FilterParser<'a> {
    lexer: Lexer<'a>,
    /// The current (not yet consumed) token.
    current: Token,
    /// Parenthesized groups currently open.
    open_groups: usize,
}

impl<'a> FilterParser<'a> {
    /// Parses a filter expression string into an [`Expr`] AST.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::EmptyExpression` if the input is blank.
    ///
    /// Returns `FilterError::Lex` for characters that are not part of any token.
    ///
    /// Returns `FilterError::Parse` for the first token that does not fit the
    /// grammar; no partial AST is produced.
    ///
    /// Returns `FilterError::TooDeep` if nesting exceeds [`MAX_NESTING_DEPTH`],
    /// and `FilterError::TooLarge` if the tree grows taller than
    /// [`MAX_TREE_HEIGHT`].
    pub fn parse(input: &str) -> FilterResult<Expr> {
        if input.trim().is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        log::debug!("parsing filter expression {input:?}");
        let source = normalize(input);
        let mut parser = FilterParser::new(&source)?;
        let node = parser.parse_where()?;
        log::debug!(
            "parsed filter expression (depth {}, height {})",
            node.depth,
            node.height
        );
        Ok(node.expr)
    }

    fn new(source: &'a str) -> FilterResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            open_groups: 0,
        })
    }

    /// Checks if the current token has the expected kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> FilterResult<Token> {
        let next = if self.check(TokenKind::Eof) {
            self.current.clone()
        } else {
            self.lexer.next_token()?
        };
        let token = std::mem::replace(&mut self.current, next);
        log::trace!("consumed {:?} at {}", token.kind, token.position);
        Ok(token)
    }

    /// Consumes a token of `kind`, or fails listing `expected`.
    fn expect(&mut self, kind: TokenKind, expected: &[TokenKind]) -> FilterResult<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(ParseError::mismatched(&self.current, expected).into())
        }
    }

    fn no_viable_alternative(&self, expected: &[TokenKind]) -> FilterError {
        ParseError::no_viable_alternative(&self.current, expected).into()
    }

    /// Parses `WHERE or_expr EOF`.
    fn parse_where(&mut self) -> FilterResult<Node> {
        self.expect(TokenKind::Where, &[TokenKind::Where])?;
        let node = self.parse_or_expr()?;
        if !self.check(TokenKind::Eof) {
            return Err(ParseError::mismatched(
                &self.current,
                &[TokenKind::And, TokenKind::Or, TokenKind::Eof],
            )
            .into());
        }
        Ok(node)
    }

    /// Parses `operand (operator operand)*` into a left-leaning chain.
    ///
    /// The whole chain adds one nesting level over its deepest operand.
    fn parse_chain(
        &mut self,
        operator: TokenKind,
        combine: fn(Expr, Expr) -> Expr,
        operand: fn(&mut Self) -> FilterResult<Node>,
    ) -> FilterResult<Node> {
        let mut chain = operand(self)?;
        let mut operand_depth = chain.depth;

        while self.check(operator) {
            let token = self.advance()?;
            let right = operand(self)?;

            operand_depth = operand_depth.max(right.depth);
            let depth = operand_depth + 1;
            if depth > MAX_NESTING_DEPTH {
                return Err(FilterError::too_deep(MAX_NESTING_DEPTH, token.position));
            }
            let height = chain.height.max(right.height) + 1;
            if height > MAX_TREE_HEIGHT {
                return Err(FilterError::too_large(MAX_TREE_HEIGHT, token.position));
            }

            chain = Node {
                expr: combine(chain.expr, right.expr),
                depth,
                height,
            };
        }

        Ok(chain)
    }

    /// Parses OR expressions: `and_expr (OR and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Node> {
        self.parse_chain(TokenKind::Or, Expr::or, Self::parse_and_expr)
    }

    /// Parses AND expressions: `primary (AND primary)*`
    fn parse_and_expr(&mut self) -> FilterResult<Node> {
        self.parse_chain(TokenKind::And, Expr::and, Self::parse_primary)
    }

    /// Parses `"(" or_expr ")"` or `key predicate`.
    fn parse_primary(&mut self) -> FilterResult<Node> {
        match self.current.kind {
            TokenKind::LeftParen => self.parse_group(),
            TokenKind::Identifier | TokenKind::QuotedString => {
                let key = self.parse_key()?;
                self.parse_predicate(key).map(Node::leaf)
            }
            _ => Err(self.no_viable_alternative(PRIMARY_START)),
        }
    }

    fn parse_group(&mut self) -> FilterResult<Node> {
        let open = self.advance()?; // consume '('
        self.open_groups += 1;
        if self.open_groups > MAX_NESTING_DEPTH {
            return Err(FilterError::too_deep(MAX_NESTING_DEPTH, open.position));
        }

        let inner = self.parse_or_expr()?;
        self.expect(
            TokenKind::RightParen,
            &[TokenKind::RightParen, TokenKind::And, TokenKind::Or],
        )?;
        self.open_groups -= 1;

        let depth = inner.depth + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(FilterError::too_deep(MAX_NESTING_DEPTH, open.position));
        }
        let height = inner.height + 1;
        if height > MAX_TREE_HEIGHT {
            return Err(FilterError::too_large(MAX_TREE_HEIGHT, open.position));
        }
        Ok(Node {
            expr: Expr::group(inner.expr),
            depth,
            height,
        })
    }

    /// Parses `IDENTIFIER "." IDENTIFIER | IDENTIFIER | QUOTED_STRING`.
    fn parse_key(&mut self) -> FilterResult<Key> {
        if self.check(TokenKind::QuotedString) {
            let token = self.advance()?;
            let name = unquote(&token.lexeme);
            if name.is_empty() {
                return Err(ParseError::empty_key(&token).into());
            }
            return Ok(Key::quoted(name));
        }

        let parent = self.expect(
            TokenKind::Identifier,
            &[TokenKind::Identifier, TokenKind::QuotedString],
        )?;
        if !self.check(TokenKind::Dot) {
            return Ok(Key::field(parent.lexeme));
        }

        self.advance()?; // consume '.'
        let child = self.expect(TokenKind::Identifier, &[TokenKind::Identifier])?;
        Ok(Key::nested(parent.lexeme, child.lexeme))
    }

    /// Parses what follows a key: a comparison or a membership test.
    fn parse_predicate(&mut self, key: Key) -> FilterResult<Expr> {
        if let Some(op) = compare_op(self.current.kind) {
            self.advance()?;
            let value = self.parse_value()?;
            return Ok(Expr::Comparison { key, op, value });
        }

        let negated = match self.current.kind {
            TokenKind::In => false,
            TokenKind::Nin => true,
            TokenKind::Not => {
                self.advance()?; // consume NOT, IN must follow directly
                if !self.check(TokenKind::In) {
                    return Err(ParseError::mismatched(&self.current, &[TokenKind::In]).into());
                }
                true
            }
            _ => return Err(self.no_viable_alternative(PREDICATE_START)),
        };
        self.advance()?; // consume IN / NIN

        let values = self.parse_value_list()?;
        Ok(Expr::Membership {
            key,
            negated,
            values,
        })
    }

    /// Parses `"[" value ("," value)* "]"`.
    fn parse_value_list(&mut self) -> FilterResult<ValueList> {
        self.expect(TokenKind::LeftBracket, &[TokenKind::LeftBracket])?;

        let mut values = vec![self.parse_value()?];
        while self.check(TokenKind::Comma) {
            self.advance()?;
            values.push(self.parse_value()?);
        }

        self.expect(
            TokenKind::RightBracket,
            &[TokenKind::Comma, TokenKind::RightBracket],
        )?;

        ValueList::new(values).ok_or_else(|| self.no_viable_alternative(VALUE_START))
    }

    /// Parses a constant: signed number, one or more strings, or a boolean.
    fn parse_value(&mut self) -> FilterResult<Value> {
        match self.current.kind {
            TokenKind::Minus | TokenKind::Plus => {
                let sign = self.advance()?;
                let negative = sign.kind == TokenKind::Minus;
                match self.current.kind {
                    TokenKind::Integer | TokenKind::Decimal => self.parse_number(negative),
                    _ => Err(self.no_viable_alternative(&[TokenKind::Integer, TokenKind::Decimal])),
                }
            }
            TokenKind::Integer | TokenKind::Decimal => self.parse_number(false),
            TokenKind::QuotedString => {
                let mut text = String::new();
                let mut previous: Option<Token> = None;
                while self.check(TokenKind::QuotedString) {
                    let token = self.advance()?;
                    let delimiter = previous
                        .as_ref()
                        .and_then(|prev| abutting_delimiter(prev, &token));
                    if let Some(delimiter) = delimiter {
                        text.push(delimiter);
                    }
                    text.push_str(&unquote(&token.lexeme));
                    previous = Some(token);
                }
                Ok(Value::Text(text))
            }
            TokenKind::Bool => {
                let token = self.advance()?;
                Ok(Value::Bool(token.lexeme.eq_ignore_ascii_case("true")))
            }
            _ => Err(self.no_viable_alternative(VALUE_START)),
        }
    }

    /// Parses the current INTEGER or DECIMAL token with an optional sign.
    fn parse_number(&mut self, negative: bool) -> FilterResult<Value> {
        let token = self.advance()?;
        let literal = if negative {
            format!("-{}", token.lexeme)
        } else {
            token.lexeme.clone()
        };

        let out_of_range = || FilterError::from(ParseError::number_out_of_range(&token, &literal));
        if token.kind == TokenKind::Integer {
            literal.parse::<i64>().map(Value::Integer).map_err(|_| out_of_range())
        } else {
            match literal.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Value::Decimal(v)),
                _ => Err(out_of_range()),
            }
        }
    }
}

/// Parses a filter expression. Shorthand for [`FilterParser::parse`].
pub fn parse(input: &str) -> FilterResult<Expr> {
    FilterParser::parse(input)
}
