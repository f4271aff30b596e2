//! Filter expression lexer, parser and AST.
//!
//! This module turns the textual filter language into an [`Expr`] tree that
//! the [`render`](crate::render) module compiles into backend-native filters.
//!
//! # Supported Syntax
//!
//! ## Comparisons
//! - `key == value`, `!=`, `>`, `>=`, `<`, `<=`
//!
//! ## Membership
//! - `key IN [v1, v2]`
//! - `key NOT IN [v1, v2]` or `key NIN [v1, v2]` (identical meaning)
//!
//! ## Keys
//! - `country` - a metadata field
//! - `author.name` - a nested field
//! - `"foo bar 1"` - a quoted literal name
//!
//! ## Values
//! - `2020`, `-5`, `+3.14`, `1.`, `.5` - numbers, with an optional sign
//! - `'BG'` or `"BG"` - strings; adjacent strings are joined (`'a' 'b'` is `'ab'`),
//!   and a doubled delimiter embeds one (`'O''Brien'` is `O'Brien`)
//! - `true`, `false`
//!
//! ## Boolean Operators
//! - `AND` / `and` / `&&`
//! - `OR` / `or` / `||` (binds looser than AND)
//! - `()` - Grouping
//!
//! A leading `WHERE` keyword is optional.
//!
//! # Example
//!
//! ```
//! use vecfilter::filter::{CompareOp, Expr, FilterParser, Key, Value};
//!
//! let filter = FilterParser::parse("year == -5").unwrap();
//! assert_eq!(
//!     filter,
//!     Expr::Comparison {
//!         key: Key::field("year"),
//!         op: CompareOp::Eq,
//!         value: Value::Integer(-5),
//!     }
//! );
//! ```

mod ast;
mod cache;
mod diagnostics;
mod error;
mod lexer;
mod parser;

pub use ast::{CompareOp, Expr, Key, Value, ValueList};
pub use cache::{FilterExpressionParser, DEFAULT_CACHE_CAPACITY};
pub use diagnostics::Diagnostic;
pub use error::{FilterError, FilterResult, ParseError, ParseErrorReason};
pub use lexer::{tokenize, LexError, Lexer, Position, Token, TokenKind};
pub use parser::{parse, FilterParser, MAX_NESTING_DEPTH, MAX_TREE_HEIGHT};
