//! Renderers that compile a filter [`Expr`] into backend-native filter syntax.
//!
//! Every backend has one renderer. All of them:
//!
//! - spell comparison operators the backend's way;
//! - quote and escape text values so the output is always well-formed;
//! - translate logical field names through the configured [`FieldMap`];
//! - re-derive parentheses from the tree shape and the backend's own operator
//!   precedence, ignoring the source's [`Expr::Group`] markers.
//!
//! # Example
//!
//! ```
//! use vecfilter::filter::FilterParser;
//! use vecfilter::render::{render, BackendKind};
//!
//! let filter = FilterParser::parse("country == 'BG' && year == 2020").unwrap();
//! let sql = render(&filter, BackendKind::Sql, None).unwrap();
//! assert_eq!(
//!     sql,
//!     "metadata->>'country' = 'BG' AND (metadata->>'year')::numeric = 2020"
//! );
//! ```

mod cypher;
mod json;
mod pgvector;
mod sql;
mod text;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;
use thiserror::Error;

use crate::filter::{Expr, Key};

pub use cypher::Neo4jRenderer;
pub use json::{JsonDialect, JsonRenderer};
pub use pgvector::PgVectorRenderer;
pub use sql::SqlRenderer;
pub use text::TextRenderer;

/// Maps logical field names (as written in filters) to backend field names.
pub type FieldMap = BTreeMap<String, String>;

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering a filter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The backend has no way to express part of the filter.
    #[error("{backend} backend cannot render {construct}")]
    UnsupportedConstruct {
        /// The backend being rendered for.
        backend: BackendKind,
        /// What could not be expressed.
        construct: String,
    },
}

impl RenderError {
    /// Creates an unsupported-construct error.
    pub fn unsupported(backend: BackendKind, construct: impl Into<String>) -> Self {
        RenderError::UnsupportedConstruct {
            backend,
            construct: construct.into(),
        }
    }
}

/// The supported target backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The filter language itself (round trip).
    Text,
    /// PostgreSQL `WHERE` fragment over a JSONB metadata column.
    Sql,
    /// PostgreSQL JSONPath match (`metadata::jsonb @@ '...'::jsonpath`), as used by pgvector stores.
    PgVector,
    /// Neo4j Cypher predicate over flattened `metadata.*` node properties.
    Neo4j,
    /// MongoDB-style JSON filter document (`$eq`, `$in`, `$and`, ...).
    Mongo,
    /// Chroma `where` document (no membership operators).
    Chroma,
}

impl BackendKind {
    /// Every backend, in display order.
    pub const ALL: [BackendKind; 6] = [
        BackendKind::Text,
        BackendKind::Sql,
        BackendKind::PgVector,
        BackendKind::Neo4j,
        BackendKind::Mongo,
        BackendKind::Chroma,
    ];

    /// The backend's configuration name.
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Text => "text",
            BackendKind::Sql => "sql",
            BackendKind::PgVector => "pgvector",
            BackendKind::Neo4j => "neo4j",
            BackendKind::Mongo => "mongo",
            BackendKind::Chroma => "chroma",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown backend '{name}'{}", .suggestion.map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
pub struct UnknownBackendError {
    /// The name that was given.
    pub name: String,
    /// The closest known backend name, if any is close.
    pub suggestion: Option<&'static str>,
}

impl FromStr for BackendKind {
    type Err = UnknownBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if let Some(kind) = BackendKind::ALL.into_iter().find(|k| k.name() == lower) {
            return Ok(kind);
        }

        let suggestion = BackendKind::ALL
            .into_iter()
            .map(|k| (k.name(), levenshtein(&lower, k.name())))
            .filter(|(_, d)| *d <= 2)
            .min_by_key(|(_, d)| *d)
            .map(|(name, _)| name);
        Err(UnknownBackendError {
            name: s.to_string(),
            suggestion,
        })
    }
}

/// Backend configuration shared by all renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Logical-to-backend field name translation.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_map: FieldMap,
    /// JSONB column holding document metadata (`sql`, `pgvector`); also the
    /// property prefix of flattened metadata on `neo4j` nodes.
    pub metadata_column: String,
    /// Cypher variable bound to the document node (`neo4j`).
    pub node_alias: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            field_map: FieldMap::new(),
            metadata_column: "metadata".to_string(),
            node_alias: "node".to_string(),
        }
    }
}

impl RenderConfig {
    /// Default configuration with the given field map.
    pub fn with_field_map(field_map: FieldMap) -> Self {
        Self {
            field_map,
            ..Self::default()
        }
    }

    /// Resolves a key through the field map.
    ///
    /// A mapped key always becomes a single flat name; unmapped nested keys
    /// keep their two-part path.
    pub(crate) fn resolve<'a>(&'a self, key: &'a Key) -> FieldPath<'a> {
        if let Some(mapped) = self.field_map.get(&key.logical_name()) {
            return FieldPath::Flat(mapped);
        }
        match key {
            Key::Field { name } | Key::Quoted { name } => FieldPath::Flat(name),
            Key::Nested { parent, child } => FieldPath::Nested(parent, child),
        }
    }
}

/// A key after field-map translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldPath<'a> {
    /// A single field name (may contain any characters).
    Flat(&'a str),
    /// A parent object and a field inside it.
    Nested(&'a str, &'a str),
}

impl FieldPath<'_> {
    /// The path segments, outermost first.
    pub(crate) fn segments(&self) -> Vec<&str> {
        match *self {
            FieldPath::Flat(name) => vec![name],
            FieldPath::Nested(parent, child) => vec![parent, child],
        }
    }

    /// The dot-joined path.
    pub(crate) fn dotted(&self) -> Cow<'_, str> {
        match *self {
            FieldPath::Flat(name) => Cow::Borrowed(name),
            FieldPath::Nested(parent, child) => Cow::Owned(format!("{parent}.{child}")),
        }
    }
}

/// A compiler from the filter AST to one backend's filter syntax.
pub trait Renderer {
    /// The backend this renderer targets.
    fn backend(&self) -> BackendKind;

    /// Renders `expr` into the backend's native filter string.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::UnsupportedConstruct` if some node has no
    /// representation in the backend.
    fn render(&self, expr: &Expr) -> RenderResult<String>;
}

/// Binding strength of boolean operators in infix targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    Or = 1,
    And = 2,
    Predicate = 3,
}

impl Precedence {
    /// The precedence of `expr`, looking through groups.
    pub(crate) fn of(expr: &Expr) -> Self {
        match expr.ungrouped() {
            Expr::Or { .. } => Precedence::Or,
            Expr::And { .. } => Precedence::And,
            Expr::Comparison { .. } | Expr::Membership { .. } | Expr::Group { .. } => {
                Precedence::Predicate
            }
        }
    }
}

/// Whether `child` needs parentheses as an operand of a `parent` operator.
///
/// Lower-precedence children are always wrapped; an equal-precedence child
/// is wrapped only on the right, so the rendered text re-parses to the same
/// left-leaning tree.
pub(crate) fn needs_parens(child: &Expr, parent: Precedence, is_right: bool) -> bool {
    let child = Precedence::of(child);
    child < parent || (child == parent && is_right)
}

/// Wraps `text` in parentheses when `wrap` is set.
pub(crate) fn parenthesize(text: String, wrap: bool) -> String {
    if wrap {
        format!("({text})")
    } else {
        text
    }
}

/// Renders both operands of a binary node with minimal parentheses and joins
/// them with `operator`.
///
/// A left-leaning run of the same operator is rendered in one pass, so long
/// `a OR b OR c ...` chains do not recurse once per operand.
pub(crate) fn render_binary<F>(
    left: &Expr,
    right: &Expr,
    precedence: Precedence,
    operator: &str,
    mut render: F,
) -> RenderResult<String>
where
    F: FnMut(&Expr) -> RenderResult<String>,
{
    let mut rights = vec![right];
    let mut first = left;
    loop {
        match first.ungrouped() {
            Expr::And { left, right } if precedence == Precedence::And => {
                rights.push(&**right);
                first = &**left;
            }
            Expr::Or { left, right } if precedence == Precedence::Or => {
                rights.push(&**right);
                first = &**left;
            }
            _ => break,
        }
    }

    let mut text = parenthesize(render(first)?, needs_parens(first, precedence, false));
    for operand in rights.into_iter().rev() {
        let operand_text = parenthesize(render(operand)?, needs_parens(operand, precedence, true));
        text.push(' ');
        text.push_str(operator);
        text.push(' ');
        text.push_str(&operand_text);
    }
    Ok(text)
}

/// Formats a decimal so it always contains a `.` and never an exponent.
pub(crate) fn format_decimal(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Renders `expr` for `backend`, optionally translating field names.
///
/// # Errors
///
/// Returns `RenderError::UnsupportedConstruct` if the backend cannot express
/// some node of `expr`.
pub fn render(
    expr: &Expr,
    backend: BackendKind,
    field_map: Option<&FieldMap>,
) -> RenderResult<String> {
    let config = RenderConfig::with_field_map(field_map.cloned().unwrap_or_default());
    render_with(expr, backend, &config)
}

/// Renders `expr` for `backend` with a full [`RenderConfig`].
///
/// # Errors
///
/// Returns `RenderError::UnsupportedConstruct` if the backend cannot express
/// some node of `expr`.
pub fn render_with(expr: &Expr, backend: BackendKind, config: &RenderConfig) -> RenderResult<String> {
    log::debug!("rendering filter for {backend} backend");
    let result = match backend {
        BackendKind::Text => TextRenderer::new(config).render(expr),
        BackendKind::Sql => SqlRenderer::new(config).render(expr),
        BackendKind::PgVector => PgVectorRenderer::new(config).render(expr),
        BackendKind::Neo4j => Neo4jRenderer::new(config).render(expr),
        BackendKind::Mongo => JsonRenderer::new(config, JsonDialect::Mongo).render(expr),
        BackendKind::Chroma => JsonRenderer::new(config, JsonDialect::Chroma).render(expr),
    };
    if let Err(e) = &result {
        log::debug!("render failed: {e}");
    }
    result
}

#[cfg(test)]
mod tests;
