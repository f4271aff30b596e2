//! Metadata filter expressions for vector and document stores.
//!
//! This crate parses a small, SQL-flavoured filter language into a typed AST
//! and compiles that AST into the native filter syntax of a storage backend.
//!
//! ```text
//! country == 'BG' && year >= 2020 && genre IN ['drama', 'thriller']
//! ```
//!
//! - [`filter`] - lexer, parser, AST, errors and diagnostics.
//! - [`render`] - one renderer per backend (`text`, `sql`, `pgvector`,
//!   `neo4j`, `mongo`, `chroma`).
//!
//! # Example
//!
//! ```
//! use vecfilter::render::BackendKind;
//!
//! let filter = vecfilter::parse("country == 'BG' && year >= 2020").unwrap();
//! let mongo = vecfilter::render(&filter, BackendKind::Mongo, None).unwrap();
//! assert_eq!(
//!     mongo,
//!     r#"{"$and":[{"country":{"$eq":"BG"}},{"year":{"$gte":2020}}]}"#
//! );
//! ```
//!
//! The library does no I/O and keeps no state between calls. Logging goes
//! through the `log` facade; install any logger to see parse and render
//! traces.

pub mod filter;
pub mod render;

pub use filter::{parse, Expr, FilterError, FilterResult};
pub use render::{render, render_with, BackendKind, FieldMap, RenderConfig, RenderError, RenderResult};
