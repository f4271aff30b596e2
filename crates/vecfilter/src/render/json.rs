//! JSON filter documents for document and embedding stores.

use serde_json::{json, Map, Number, Value as JsonValue};

use super::{BackendKind, RenderConfig, RenderError, RenderResult, Renderer};
use crate::filter::{CompareOp, Expr, Key, Value, ValueList};

/// Which JSON filter dialect to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonDialect {
    /// MongoDB query document: dotted paths, `$in` / `$nin`.
    Mongo,
    /// Chroma `where` document: flat keys, no membership operators.
    Chroma,
}

impl JsonDialect {
    fn backend(self) -> BackendKind {
        match self {
            JsonDialect::Mongo => BackendKind::Mongo,
            JsonDialect::Chroma => BackendKind::Chroma,
        }
    }
}

/// Renders a filter as a compact JSON query document.
///
/// ```text
/// country == 'BG' && year >= 2020
/// {"$and":[{"country":{"$eq":"BG"}},{"year":{"$gte":2020}}]}
/// ```
///
/// Chains of the same boolean operator are flattened into one `$and` or
/// `$or` array. Structure replaces parentheses entirely.
#[derive(Debug, Clone, Copy)]
pub struct JsonRenderer<'a> {
    config: &'a RenderConfig,
    dialect: JsonDialect,
}

impl<'a> JsonRenderer<'a> {
    pub fn new(config: &'a RenderConfig, dialect: JsonDialect) -> Self {
        Self { config, dialect }
    }

    /// Builds the filter document without serializing it.
    ///
    /// # Errors
    ///
    /// Same as [`Renderer::render`].
    pub fn to_value(&self, expr: &Expr) -> RenderResult<JsonValue> {
        match expr {
            Expr::Comparison { key, op, value } => {
                self.condition(key, operator(*op), self.value(value)?)
            }
            Expr::Membership {
                key,
                negated,
                values,
            } => {
                if self.dialect == JsonDialect::Chroma {
                    return Err(self.unsupported(if *negated { "NOT IN" } else { "IN" }));
                }
                let op = if *negated { "$nin" } else { "$in" };
                self.condition(key, op, self.list(values)?)
            }
            Expr::And { .. } => self.junction(expr, "$and"),
            Expr::Or { .. } => self.junction(expr, "$or"),
            Expr::Group { inner } => self.to_value(inner),
        }
    }

    fn unsupported(&self, construct: impl Into<String>) -> RenderError {
        RenderError::unsupported(self.dialect.backend(), construct)
    }

    /// `{"<field>": {"<op>": <operand>}}`
    fn condition(&self, key: &Key, op: &str, operand: JsonValue) -> RenderResult<JsonValue> {
        let field = self.field(key)?;
        let mut condition = Map::new();
        condition.insert(field, json!({ op: operand }));
        Ok(JsonValue::Object(condition))
    }

    /// `{"$and": [...]}` with same-operator children flattened in order.
    fn junction(&self, expr: &Expr, op: &str) -> RenderResult<JsonValue> {
        let mut operands = Vec::new();
        self.collect_operands(expr, op, &mut operands)?;
        Ok(json!({ op: operands }))
    }

    fn collect_operands(
        &self,
        expr: &Expr,
        op: &str,
        operands: &mut Vec<JsonValue>,
    ) -> RenderResult<()> {
        let mut pending = vec![expr];
        while let Some(next) = pending.pop() {
            match (next.ungrouped(), op) {
                (Expr::And { left, right }, "$and") | (Expr::Or { left, right }, "$or") => {
                    pending.push(&**right);
                    pending.push(&**left);
                }
                (other, _) => operands.push(self.to_value(other)?),
            }
        }
        Ok(())
    }

    fn field(&self, key: &Key) -> RenderResult<String> {
        let path = self.config.resolve(key);
        let dotted = path.dotted();
        if path.segments().iter().any(|s| s.is_empty()) {
            return Err(self.unsupported("an empty key"));
        }
        if dotted.starts_with('$') {
            return Err(self.unsupported(format!("key '{dotted}' starting with '$'")));
        }
        let is_literal_name = matches!(key, Key::Quoted { .. })
            && !self.config.field_map.contains_key(&key.logical_name());
        if self.dialect == JsonDialect::Mongo && is_literal_name && dotted.contains('.') {
            return Err(self.unsupported(format!("quoted key '{dotted}' containing '.'")));
        }
        Ok(dotted.into_owned())
    }

    fn value(&self, value: &Value) -> RenderResult<JsonValue> {
        match value {
            Value::Integer(n) => Ok(JsonValue::from(*n)),
            Value::Decimal(d) => Number::from_f64(*d)
                .map(JsonValue::Number)
                .ok_or_else(|| self.unsupported(format!("non-finite decimal {d}"))),
            Value::Text(s) => Ok(JsonValue::String(s.clone())),
            Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        }
    }

    fn list(&self, values: &ValueList) -> RenderResult<JsonValue> {
        values
            .iter()
            .map(|v| self.value(v))
            .collect::<RenderResult<Vec<_>>>()
            .map(JsonValue::Array)
    }
}

impl Renderer for JsonRenderer<'_> {
    fn backend(&self) -> BackendKind {
        self.dialect.backend()
    }

    fn render(&self, expr: &Expr) -> RenderResult<String> {
        let document = self.to_value(expr)?;
        serde_json::to_string(&document)
            .map_err(|e| self.unsupported(format!("document that cannot be serialized: {e}")))
    }
}

fn operator(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "$eq",
        CompareOp::Ne => "$ne",
        CompareOp::Gt => "$gt",
        CompareOp::Ge => "$gte",
        CompareOp::Lt => "$lt",
        CompareOp::Le => "$lte",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterParser;

    fn mongo(input: &str) -> JsonValue {
        let config = RenderConfig::default();
        let expr = FilterParser::parse(input).unwrap();
        JsonRenderer::new(&config, JsonDialect::Mongo)
            .to_value(&expr)
            .unwrap()
    }

    #[test]
    fn test_flattens_same_operator_chains() {
        assert_eq!(
            mongo("a == 1 && b == 2 && c == 3"),
            json!({"$and": [{"a": {"$eq": 1}}, {"b": {"$eq": 2}}, {"c": {"$eq": 3}}]})
        );
    }

    #[test]
    fn test_groups_flatten_too() {
        assert_eq!(mongo("a == 1 && (b == 2 && c == 3)"), mongo("a == 1 && b == 2 && c == 3"));
    }

    #[test]
    fn test_mixed_operators_nest() {
        assert_eq!(
            mongo("a == 1 || b == 2 && c == 3"),
            json!({"$or": [
                {"a": {"$eq": 1}},
                {"$and": [{"b": {"$eq": 2}}, {"c": {"$eq": 3}}]}
            ]})
        );
    }

    #[test]
    fn test_decimal_values() {
        assert_eq!(mongo("price < 9.5"), json!({"price": {"$lt": 9.5}}));
    }
}
