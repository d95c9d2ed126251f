use std::{cmp::Ordering, ops::Not};

use serde_json::Value;

use crate::item::{AttrPath, Item};

/// Comparison operator of [`Filter::Cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Typed filter and condition expression.
///
/// Used both as a scan filter and as the condition of a conditional update.
/// Built from the constructors and combined with [`Filter::and`],
/// [`Filter::or`] and `!`:
///
/// ```
/// use quorum_store::Filter;
///
/// let filter = Filter::eq("type", "text")
///     .and(!Filter::is_in("taskId", ["t-1", "t-2"]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Attribute compared with a value.
    Cmp {
        path: AttrPath,
        op: CmpOp,
        value: Value,
    },
    /// Attribute equals one of the values.
    In { path: AttrPath, values: Vec<Value> },
    /// Attribute is present (any value, including null).
    Exists(AttrPath),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    fn cmp(path: impl Into<AttrPath>, op: CmpOp, value: impl Into<Value>) -> Self {
        Filter::Cmp {
            path: path.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(path: impl Into<AttrPath>, value: impl Into<Value>) -> Self {
        Self::cmp(path, CmpOp::Eq, value)
    }

    pub fn ne(path: impl Into<AttrPath>, value: impl Into<Value>) -> Self {
        Self::cmp(path, CmpOp::Ne, value)
    }

    pub fn lt(path: impl Into<AttrPath>, value: impl Into<Value>) -> Self {
        Self::cmp(path, CmpOp::Lt, value)
    }

    pub fn le(path: impl Into<AttrPath>, value: impl Into<Value>) -> Self {
        Self::cmp(path, CmpOp::Le, value)
    }

    pub fn gt(path: impl Into<AttrPath>, value: impl Into<Value>) -> Self {
        Self::cmp(path, CmpOp::Gt, value)
    }

    pub fn ge(path: impl Into<AttrPath>, value: impl Into<Value>) -> Self {
        Self::cmp(path, CmpOp::Ge, value)
    }

    pub fn is_in<I, V>(path: impl Into<AttrPath>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            path: path.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exists(path: impl Into<AttrPath>) -> Self {
        Filter::Exists(path.into())
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    /// Conjunction of all filters; `None` when the list is empty.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Option<Self> {
        filters.into_iter().reduce(Filter::and)
    }

    /// Evaluate the filter against an item.
    ///
    /// Comparisons against a missing attribute are false, except `ne`, which
    /// is true.
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Filter::Cmp { path, op, value } => match path.get(item) {
                None => *op == CmpOp::Ne,
                Some(actual) => compare(*op, actual, value),
            },
            Filter::In { path, values } => path
                .get(item)
                .is_some_and(|actual| values.iter().any(|v| same(actual, v))),
            Filter::Exists(path) => path.get(item).is_some(),
            Filter::And(a, b) => a.matches(item) && b.matches(item),
            Filter::Or(a, b) => a.matches(item) || b.matches(item),
            Filter::Not(inner) => !inner.matches(item),
        }
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Self::Output {
        Filter::Not(Box::new(self))
    }
}

fn compare(op: CmpOp, actual: &Value, expected: &Value) -> bool {
    match op {
        CmpOp::Eq => same(actual, expected),
        CmpOp::Ne => !same(actual, expected),
        CmpOp::Lt => order(actual, expected) == Some(Ordering::Less),
        CmpOp::Le => matches!(order(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        CmpOp::Gt => order(actual, expected) == Some(Ordering::Greater),
        CmpOp::Ge => matches!(
            order(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Equality that treats `5` and `5.0` as the same number.
fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => order(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Numbers and strings are ordered; everything else is unordered.
fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> Item {
        json!({
            "taskId": "t-3",
            "type": "text",
            "progress": {"current": 2, "total": 3},
            "class": {"A": 5, "B": 1}
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn equality_and_exclusion() {
        let f = Filter::eq("type", "text").and(!Filter::is_in("taskId", ["t-1", "t-2"]));
        assert!(f.matches(&item()));

        let f = Filter::eq("type", "text").and(!Filter::is_in("taskId", ["t-3"]));
        assert!(!f.matches(&item()));
    }

    #[test]
    fn numeric_comparisons_on_nested_paths() {
        let it = item();
        assert!(Filter::lt("progress.current", 3).matches(&it));
        assert!(Filter::le("progress.current", 2).matches(&it));
        assert!(Filter::ge("class.A", 5.0).matches(&it));
        assert!(!Filter::gt("class.B", 1).matches(&it));
        assert!(Filter::eq("progress.total", 3.0).matches(&it));
    }

    #[test]
    fn missing_attributes() {
        let it = item();
        assert!(!Filter::eq("datasetId", "x").matches(&it));
        assert!(Filter::ne("datasetId", "x").matches(&it));
        assert!(!Filter::exists("datasetId").matches(&it));
        assert!(Filter::exists("class.B").matches(&it));
        assert!(!Filter::is_in("datasetId", ["x"]).matches(&it));
    }

    #[test]
    fn mixed_types_never_order() {
        let it = item();
        assert!(!Filter::lt("type", 3).matches(&it));
        assert!(!Filter::ge("type", 3).matches(&it));
    }

    #[test]
    fn all_combines_or_yields_none() {
        assert!(Filter::all(Vec::new()).is_none());

        let f = Filter::all([Filter::eq("type", "text"), Filter::exists("taskId")]).unwrap();
        assert!(f.matches(&item()));
        assert!(Filter::eq("type", "image").or(Filter::exists("taskId")).matches(&item()));
    }
}
