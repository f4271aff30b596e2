//! Renders filters back into the filter language.

use super::{
    format_decimal, render_binary, BackendKind, Precedence, RenderConfig, RenderError,
    RenderResult, Renderer,
};
use crate::filter::{Expr, Key, Lexer, TokenKind, Value, ValueList};

/// Renders the canonical filter-language spelling of an expression.
///
/// The output always re-parses to an equivalent tree: upper-case keywords,
/// single-quoted strings, `NOT IN` for negated membership, and only the
/// parentheses the tree shape needs.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> TextRenderer<'a> {
    /// Creates a renderer using `config`'s field map.
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    fn unsupported(&self, construct: impl Into<String>) -> RenderError {
        RenderError::unsupported(BackendKind::Text, construct)
    }

    fn expr(&self, expr: &Expr) -> RenderResult<String> {
        match expr {
            Expr::Comparison { key, op, value } => Ok(format!(
                "{} {} {}",
                self.key(key)?,
                op.symbol(),
                self.value(value)?
            )),
            Expr::Membership {
                key,
                negated,
                values,
            } => Ok(format!(
                "{} {} [{}]",
                self.key(key)?,
                if *negated { "NOT IN" } else { "IN" },
                self.list(values)?
            )),
            Expr::And { left, right } => {
                render_binary(left, right, Precedence::And, "AND", |e| self.expr(e))
            }
            Expr::Or { left, right } => {
                render_binary(left, right, Precedence::Or, "OR", |e| self.expr(e))
            }
            Expr::Group { inner } => self.expr(inner),
        }
    }

    fn key(&self, key: &Key) -> RenderResult<String> {
        if let Some(mapped) = self.config.field_map.get(&key.logical_name()) {
            return self.name(mapped);
        }
        match key {
            Key::Field { name } => self.name(name),
            Key::Quoted { name } => self.quoted_name(name),
            Key::Nested { parent, child } => {
                if is_bare_name(parent) && is_bare_name(child) {
                    Ok(format!("{parent}.{child}"))
                } else {
                    Err(self.unsupported(format!(
                        "nested key '{parent}.{child}' with a non-identifier segment"
                    )))
                }
            }
        }
    }

    /// A field name, bare when it lexes as a plain identifier.
    fn name(&self, name: &str) -> RenderResult<String> {
        if is_bare_name(name) {
            Ok(name.to_string())
        } else {
            self.quoted_name(name)
        }
    }

    fn quoted_name(&self, name: &str) -> RenderResult<String> {
        if name.is_empty() {
            return Err(self.unsupported("an empty key"));
        }
        Ok(format!("\"{}\"", self.escape(name, '"')?))
    }

    fn value(&self, value: &Value) -> RenderResult<String> {
        match value {
            Value::Integer(n) => Ok(n.to_string()),
            Value::Decimal(d) if d.is_finite() => Ok(format_decimal(*d)),
            Value::Decimal(d) => Err(self.unsupported(format!("non-finite decimal {d}"))),
            Value::Text(s) => Ok(format!("'{}'", self.escape(s, '\'')?)),
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

    /// Backslash-escapes `\` and `quote`. Line breaks cannot appear inside a
    /// quoted string at all.
    fn escape(&self, text: &str, quote: char) -> RenderResult<String> {
        let mut escaped = String::with_capacity(text.len() + 2);
        for c in text.chars() {
            match c {
                '\n' | '\r' => return Err(self.unsupported("a string containing a line break")),
                '\\' => escaped.push_str("\\\\"),
                c if c == quote => {
                    escaped.push('\\');
                    escaped.push(c);
                }
                c => escaped.push(c),
            }
        }
        Ok(escaped)
    }
}

impl Renderer for TextRenderer<'_> {
    fn backend(&self) -> BackendKind {
        BackendKind::Text
    }

    fn render(&self, expr: &Expr) -> RenderResult<String> {
        self.expr(expr)
    }
}

/// True if `name` lexes as a single identifier token (not a keyword).
fn is_bare_name(name: &str) -> bool {
    let mut lexer = Lexer::new(name);
    matches!(
        (lexer.next_token(), lexer.next_token()),
        (Ok(first), Ok(second))
            if first.kind == TokenKind::Identifier
                && first.lexeme == name
                && second.kind == TokenKind::Eof
    )
}
