//! Neo4j Cypher renderer.
//!
//! Document metadata is stored as flattened node properties named
//! `metadata.<key>`, so every key becomes a backtick-quoted property of the
//! node variable: ``node.`metadata.country` = 'BG'``.

use super::{
    format_decimal, render_binary, BackendKind, Precedence, RenderConfig, RenderError,
    RenderResult, Renderer,
};
use crate::filter::{CompareOp, Expr, Key, Value, ValueList};

#[derive(Debug, Clone, Copy)]
pub struct Neo4jRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> Neo4jRenderer<'a> {
    /// Creates a renderer using the node alias and property prefix from `config`.
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    fn unsupported(&self, construct: impl Into<String>) -> RenderError {
        RenderError::unsupported(BackendKind::Neo4j, construct)
    }

    fn expr(&self, expr: &Expr) -> RenderResult<String> {
        match expr {
            Expr::Comparison { key, op, value } => Ok(format!(
                "{} {} {}",
                self.property(key),
                cypher_op(*op),
                self.value(value)?
            )),
            Expr::Membership {
                key,
                negated,
                values,
            } => {
                let test = format!("{} IN [{}]", self.property(key), self.list(values)?);
                Ok(if *negated { format!("NOT {test}") } else { test })
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

    fn property(&self, key: &Key) -> String {
        let path = self.config.resolve(key).dotted().into_owned();
        let prefix = &self.config.metadata_column;
        let name = if prefix.is_empty() {
            path
        } else {
            format!("{prefix}.{path}")
        };
        format!("{}.{}", escape_name(&self.config.node_alias), quote_name(&name))
    }

    fn value(&self, value: &Value) -> RenderResult<String> {
        match value {
            Value::Integer(n) => Ok(n.to_string()),
            Value::Decimal(d) if d.is_finite() => Ok(format_decimal(*d)),
            Value::Decimal(d) => Err(self.unsupported(format!("non-finite decimal {d}"))),
            Value::Text(s) => Ok(quote_string(s)),
            Value::Bool(b) => Ok(b.to_string()),
        }
    }

    fn list(&self, values: &ValueList) -> RenderResult<String> {
        let rendered = values
            .iter()
            .map(|v| self.value(v))
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(rendered.join(", "))
    }
}

impl Renderer for Neo4jRenderer<'_> {
    fn backend(&self) -> BackendKind {
        BackendKind::Neo4j
    }

    fn render(&self, expr: &Expr) -> RenderResult<String> {
        self.expr(expr)
    }
}

fn cypher_op(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
    }
}

fn quote_name(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Cypher keywords, upper-case and sorted. Matching is case-insensitive.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "AND", "AS", "ASC", "ASCENDING", "BY", "CALL", "CASE", "CONSTRAINT",
    "CONTAINS", "CREATE", "DELETE", "DESC", "DESCENDING", "DETACH", "DISTINCT", "DO", "DROP",
    "ELSE", "END", "ENDS", "EXISTS", "FALSE", "FOR", "IN", "IS", "LIMIT", "MANDATORY",
    "MATCH", "MERGE", "NOT", "NULL", "OF", "ON", "OPTIONAL", "OR", "ORDER", "REMOVE",
    "REQUIRE", "RETURN", "SCALAR", "SET", "SKIP", "STARTS", "THEN", "TRUE", "UNION",
    "UNIQUE", "UNWIND", "USE", "WHEN", "WHERE", "WITH", "XOR", "YIELD",
];

/// Variable names are left bare when they are plain, non-reserved identifiers.
fn escape_name(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && RESERVED_WORDS
            .binary_search(&name.to_ascii_uppercase().as_str())
            .is_err();
    if simple {
        name.to_string()
    } else {
        quote_name(name)
    }
}

/// A single-quoted Cypher string literal.
fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
