//! PostgreSQL renderer for metadata stored in a JSONB column.

use super::{
    format_decimal, render_binary, BackendKind, FieldPath, Precedence, RenderConfig, RenderError,
    RenderResult, Renderer,
};
use crate::filter::{CompareOp, Expr, Key, Value, ValueList};

/// How a JSONB text extraction must be cast before comparing with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cast {
    Text,
    Numeric,
    Boolean,
}

impl Cast {
    fn of(value: &Value) -> Self {
        match value {
            Value::Text(_) => Cast::Text,
            Value::Integer(_) | Value::Decimal(_) => Cast::Numeric,
            Value::Bool(_) => Cast::Boolean,
        }
    }
}

/// Renders a `WHERE` clause fragment over a JSONB metadata column.
///
/// ```text
/// country == 'BG' && year >= 2020
/// metadata->>'country' = 'BG' AND (metadata->>'year')::numeric >= 2020
/// ```
///
/// Values are emitted as SQL literals with quotes doubled; identifiers and
/// JSON keys are quoted the same way, so no input can escape its literal.
#[derive(Debug, Clone, Copy)]
pub struct SqlRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    fn unsupported(&self, construct: impl Into<String>) -> RenderError {
        RenderError::unsupported(BackendKind::Sql, construct)
    }

    fn expr(&self, expr: &Expr) -> RenderResult<String> {
        match expr {
            Expr::Comparison { key, op, value } => Ok(format!(
                "{} {} {}",
                self.field(key, Cast::of(value))?,
                sql_op(*op),
                self.literal(value)?
            )),
            Expr::Membership {
                key,
                negated,
                values,
            } => {
                let cast = self.list_cast(values)?;
                let literals = values
                    .iter()
                    .map(|v| self.literal(v))
                    .collect::<RenderResult<Vec<_>>>()?;
                Ok(format!(
                    "{} {} ({})",
                    self.field(key, cast)?,
                    if *negated { "NOT IN" } else { "IN" },
                    literals.join(", ")
                ))
            }
            Expr::And { left, right } => {
                render_binary(left, right, Precedence::And, "AND", |e| self.expr(e))
            }
            Expr::Or { left, right } => {
                render_binary(left, right, Precedence::Or, "OR", |e| self.expr(e))
            }
            Expr::Group { inner } => self.expr(inner),
        }
    }

    /// A single cast has to cover the whole list.
    fn list_cast(&self, values: &ValueList) -> RenderResult<Cast> {
        let first = values.first();
        let cast = Cast::of(first);
        match values.iter().find(|v| Cast::of(v) != cast) {
            Some(other) => Err(self.unsupported(format!(
                "an IN list mixing {} and {} values",
                first.type_name(),
                other.type_name()
            ))),
            None => Ok(cast),
        }
    }

    /// The JSONB text extraction for `key`, cast for comparison.
    fn field(&self, key: &Key, cast: Cast) -> RenderResult<String> {
        let column = quote_identifier(&self.config.metadata_column);
        let access = match self.config.resolve(key) {
            FieldPath::Flat(name) => format!("{column}->>{}", self.string(name)?),
            FieldPath::Nested(parent, child) => format!(
                "{column}->{}->>{}",
                self.string(parent)?,
                self.string(child)?
            ),
        };
        Ok(match cast {
            Cast::Text => access,
            Cast::Numeric => format!("({access})::numeric"),
            Cast::Boolean => format!("({access})::boolean"),
        })
    }

    fn literal(&self, value: &Value) -> RenderResult<String> {
        match value {
            Value::Integer(n) => Ok(n.to_string()),
            Value::Decimal(d) if d.is_finite() => Ok(format_decimal(*d)),
            Value::Decimal(d) => Err(self.unsupported(format!("non-finite decimal {d}"))),
            Value::Text(s) => self.string(s),
            Value::Bool(b) => Ok(b.to_string()),
        }
    }

    /// A standard SQL string literal.
    fn string(&self, text: &str) -> RenderResult<String> {
        if text.contains('\0') {
            return Err(self.unsupported("a string containing a NUL character"));
        }
        Ok(quote_literal(text))
    }
}

impl Renderer for SqlRenderer<'_> {
    fn backend(&self) -> BackendKind {
        BackendKind::Sql
    }

    fn render(&self, expr: &Expr) -> RenderResult<String> {
        self.expr(expr)
    }
}

fn sql_op(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
    }
}

/// Wraps `text` in single quotes, doubling embedded quotes.
pub(crate) fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// PostgreSQL keywords that cannot stand bare as a column reference, sorted.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "between", "bigint", "binary", "bit", "boolean", "both", "case", "cast",
    "char", "character", "check", "coalesce", "collate", "collation", "column", "concurrently",
    "constraint", "create", "cross", "current_catalog", "current_date", "current_role",
    "current_schema", "current_time", "current_timestamp", "current_user", "dec", "decimal",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "exists",
    "extract", "false", "fetch", "float", "for", "foreign", "freeze", "from", "full",
    "grant", "greatest", "group", "grouping", "having", "ilike", "in", "initially", "inner",
    "inout", "int", "integer", "intersect", "interval", "into", "is", "isnull", "join",
    "lateral", "leading", "least", "left", "like", "limit", "localtime", "localtimestamp",
    "national", "natural", "nchar", "none", "normalize", "not", "notnull", "null", "nullif",
    "numeric", "offset", "on", "only", "or", "order", "out", "outer", "overlaps", "overlay",
    "placing", "position", "precision", "primary", "real", "references", "returning",
    "right", "row", "select", "session_user", "setof", "similar", "smallint", "some",
    "substring", "symmetric", "system_user", "table", "tablesample", "then", "time",
    "timestamp", "to", "trailing", "treat", "trim", "true", "union", "unique", "user",
    "using", "values", "varchar", "variadic", "verbose", "when", "where", "window", "with",
];

/// Leaves lower-case, non-reserved identifiers bare and double-quotes
/// everything else.
pub(crate) fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && RESERVED_WORDS.binary_search(&name).is_err();
    if simple {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
