//! Abstract Syntax Tree (AST) for filter expressions.

use serde::Serialize;

/// A reference to a metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Key {
    /// A bare identifier, e.g. `country`.
    Field {
        /// The field name.
        name: String,
    },

    /// A two-part dotted path, e.g. `author.name`.
    Nested {
        /// The outer field.
        parent: String,
        /// The field inside `parent`.
        child: String,
    },

    /// A quoted literal name, e.g. `"foo bar 1"`. Dots inside are part of
    /// the name, not a path.
    Quoted {
        /// The unquoted field name.
        name: String,
    },
}

impl Key {
    /// Creates a bare field key.
    pub fn field(name: impl Into<String>) -> Self {
        Key::Field { name: name.into() }
    }

    /// Creates a dotted two-part key.
    pub fn nested(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Key::Nested {
            parent: parent.into(),
            child: child.into(),
        }
    }

    /// Creates a quoted literal key.
    pub fn quoted(name: impl Into<String>) -> Self {
        Key::Quoted { name: name.into() }
    }

    /// The logical field name, as used for field-map lookups.
    ///
    /// Nested keys are joined with a dot.
    pub fn logical_name(&self) -> String {
        match self {
            Key::Field { name } | Key::Quoted { name } => name.clone(),
            Key::Nested { parent, child } => format!("{parent}.{child}"),
        }
    }
}

/// A literal constant on the right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// A signed integer; a leading `-` in the source is folded in.
    Integer(i64),
    /// A signed decimal; a leading `-` in the source is folded in.
    Decimal(f64),
    /// One or more adjacent quoted strings, joined. Literals that touch and
    /// share a delimiter keep one copy of it between them.
    Text(String),
    /// `true` or `false`.
    Bool(bool),
}

impl Value {
    /// Short name of the value's type, used in render errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Bool(_) => "boolean",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// A non-empty, ordered list of values for membership tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueList(Vec<Value>);

impl ValueList {
    /// Creates a list, or `None` if `values` is empty.
    pub fn new(values: Vec<Value>) -> Option<Self> {
        if values.is_empty() {
            None
        } else {
            Some(Self(values))
        }
    }

    /// Creates a list holding one value.
    pub fn single(value: Value) -> Self {
        Self(vec![value])
    }

    /// The values in source order.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// The first value (lists are never empty).
    pub fn first(&self) -> &Value {
        &self.0[0]
    }

    /// Number of values (always at least one).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the values in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ValueList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl CompareOp {
    /// The operator as written in filter text.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// Represents a parsed filter expression.
///
/// Each node owns its children; the tree is immutable once built and can be
/// shared read-only across threads and renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    /// `key <op> value`
    Comparison {
        /// The field being compared.
        key: Key,
        /// The comparison operator.
        op: CompareOp,
        /// The constant compared against.
        value: Value,
    },

    /// `key IN [...]`, or `key NOT IN [...]` / `key NIN [...]` when negated.
    Membership {
        /// The field being tested.
        key: Key,
        /// True for `NOT IN` and `NIN`.
        negated: bool,
        /// The candidate values.
        values: ValueList,
    },

    /// Logical AND of two expressions.
    And {
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },

    /// Logical OR of two expressions.
    Or {
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },

    /// Parentheses written in the source.
    Group {
        /// The parenthesized expression.
        inner: Box<Expr>,
    },
}

impl Expr {
    /// Creates a comparison.
    pub fn compare(key: Key, op: CompareOp, value: impl Into<Value>) -> Self {
        Expr::Comparison {
            key,
            op,
            value: value.into(),
        }
    }

    /// `key == value`
    ///
    /// # Example
    ///
    /// ```
    /// use vecfilter::filter::{Expr, Key};
    ///
    /// let filter = Expr::and(
    ///     Expr::eq(Key::field("country"), "BG"),
    ///     Expr::gte(Key::field("year"), 2020),
    /// );
    /// assert!(matches!(filter, Expr::And { .. }));
    /// ```
    pub fn eq(key: Key, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Eq, value)
    }

    /// `key != value`
    pub fn ne(key: Key, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Ne, value)
    }

    /// `key > value`
    pub fn gt(key: Key, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Gt, value)
    }

    /// `key >= value`
    pub fn gte(key: Key, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Ge, value)
    }

    /// `key < value`
    pub fn lt(key: Key, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Lt, value)
    }

    /// `key <= value`
    pub fn lte(key: Key, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Le, value)
    }

    /// `key IN [values]`
    pub fn in_list(key: Key, values: ValueList) -> Self {
        Expr::Membership {
            key,
            negated: false,
            values,
        }
    }

    /// `key NOT IN [values]`
    pub fn not_in(key: Key, values: ValueList) -> Self {
        Expr::Membership {
            key,
            negated: true,
            values,
        }
    }

    /// Creates an AND expression from two expressions.
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates an OR expression from two expressions.
    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Wraps an expression in explicit parentheses.
    pub fn group(inner: Expr) -> Self {
        Expr::Group {
            inner: Box::new(inner),
        }
    }

    /// Returns the expression with any enclosing `Group` layers removed.
    pub fn ungrouped(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Group { inner } = expr {
            expr = inner;
        }
        expr
    }
}
