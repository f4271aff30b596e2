//! PostgreSQL JSONPath renderer, the filter format of pgvector-backed stores.
//!
//! The rendered path is matched against the metadata column with the `@@`
//! operator, e.g. `metadata::jsonb @@ '$.country == "BG"'::jsonpath`.
//! Bind the output as a query parameter, or use
//! [`PgVectorRenderer::render_predicate`] to get the whole SQL predicate with
//! the path already quoted as a literal.

use super::sql::{quote_identifier, quote_literal};
use super::{
    format_decimal, parenthesize, render_binary, BackendKind, Precedence,
    RenderConfig, RenderError, RenderResult, Renderer,
};
use crate::filter::{CompareOp, Expr, Key, Value, ValueList};

#[derive(Debug, Clone, Copy)]
pub struct PgVectorRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> PgVectorRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Renders `<column>::jsonb @@ '<path>'::jsonpath`.
    ///
    /// # Errors
    ///
    /// Same as [`Renderer::render`].
    pub fn render_predicate(&self, expr: &Expr) -> RenderResult<String> {
        let path = self.expr(expr)?;
        Ok(format!(
            "{}::jsonb @@ {}::jsonpath",
            quote_identifier(&self.config.metadata_column),
            quote_literal(&path)
        ))
    }

    fn unsupported(&self, construct: impl Into<String>) -> RenderError {
        RenderError::unsupported(BackendKind::PgVector, construct)
    }

    fn expr(&self, expr: &Expr) -> RenderResult<String> {
        match expr {
            Expr::Comparison { key, op, value } => Ok(format!(
                "{} {} {}",
                self.path(key)?,
                jsonpath_op(*op),
                self.value(value)?
            )),
            Expr::Membership {
                key,
                negated,
                values,
            } => self.membership(key, *negated, values),
            Expr::And { left, right } => {
                render_binary(left, right, Precedence::And, "&&", |e| self.expr(e))
            }
            Expr::Or { left, right } => {
                render_binary(left, right, Precedence::Or, "||", |e| self.expr(e))
            }
            Expr::Group { inner } => self.expr(inner),
        }
    }

    /// JSONPath has no list membership; expand to a disjunction of equalities.
    fn membership(&self, key: &Key, negated: bool, values: &ValueList) -> RenderResult<String> {
        let path = self.path(key)?;
        let alternatives = values
            .iter()
            .map(|v| Ok(format!("{path} == {}", self.value(v)?)))
            .collect::<RenderResult<Vec<_>>>()?;
        let disjunction = alternatives.join(" || ");

        if negated {
            Ok(format!("!({disjunction})"))
        } else {
            Ok(parenthesize(disjunction, values.len() > 1))
        }
    }

    fn path(&self, key: &Key) -> RenderResult<String> {
        let resolved = self.config.resolve(key);
        let mut path = String::from("$");
        for segment in resolved.segments() {
            path.push('.');
            if is_path_identifier(segment) {
                path.push_str(segment);
            } else {
                path.push_str(&self.string(segment)?);
            }
        }
        Ok(path)
    }

    fn value(&self, value: &Value) -> RenderResult<String> {
        match value {
            Value::Integer(n) => Ok(n.to_string()),
            Value::Decimal(d) if d.is_finite() => Ok(format_decimal(*d)),
            Value::Decimal(d) => Err(self.unsupported(format!("non-finite decimal {d}"))),
            Value::Text(s) => self.string(s),
            Value::Bool(b) => Ok(b.to_string()),
        }
    }

    /// A JSONPath string literal; the escapes match JSON's.
    fn string(&self, text: &str) -> RenderResult<String> {
        if text.contains('\0') {
            return Err(self.unsupported("a string containing a NUL character"));
        }
        serde_json::to_string(text).map_err(|e| self.unsupported(format!("string {text:?}: {e}")))
    }
}

impl Renderer for PgVectorRenderer<'_> {
    fn backend(&self) -> BackendKind {
        BackendKind::PgVector
    }

    fn render(&self, expr: &Expr) -> RenderResult<String> {
        self.expr(expr)
    }
}

fn jsonpath_op(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "==",
        CompareOp::Ne => "!=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
    }
}

/// JSONPath member names that need no quoting.
fn is_path_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterParser;
    use crate::render::needs_parens;

    fn render(input: &str) -> String {
        let config = RenderConfig::default();
        let expr = FilterParser::parse(input).unwrap();
        PgVectorRenderer::new(&config).render(&expr).unwrap()
    }

    #[test]
    fn test_single_value_membership_needs_no_parens() {
        assert_eq!(render("x IN [1]"), "$.x == 1");
        assert_eq!(render("x NIN [1]"), "!($.x == 1)");
    }

    #[test]
    fn test_membership_inside_and_stays_grouped() {
        assert_eq!(
            render("x IN [1, 2] && y == 'a'"),
            "($.x == 1 || $.x == 2) && $.y == \"a\""
        );
    }

    #[test]
    fn test_needs_parens_sees_membership_as_predicate() {
        let expr = FilterParser::parse("x IN [1, 2]").unwrap();
        assert!(!needs_parens(&expr, Precedence::And, true));
    }

    #[test]
    fn test_path_quoting() {
        assert_eq!(render("\"foo bar 1\" == 'bar.foo'"), "$.\"foo bar 1\" == \"bar.foo\"");
        assert_eq!(render("\"2020\" == 1"), "$.\"2020\" == 1");
    }
}
