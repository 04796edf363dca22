//! XPath's four-valued data model: Number, Boolean, String, NodeSet.
//!
//! A `Value` never borrows the document it was produced from — a
//! `NodeSet` is just a `Vec<NodeId>` — so evaluating an expression and
//! holding onto its result doesn't tie down a document's lifetime any
//! more than the node ids themselves require.

use std::collections::HashSet;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    String(String),
    NodeSet(Vec<NodeId>),
}

impl Default for Value {
    fn default() -> Self {
        Value::NodeSet(Vec::new())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::NodeSet(vec![id])
    }
}

/// XPath's canonical number-to-string rendering: integral values carry
/// no decimal point, and the three non-finite values get their own
/// names.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Value {
    pub fn empty_nodeset() -> Value {
        Value::NodeSet(Vec::new())
    }

    pub fn single_node(id: NodeId) -> Value {
        Value::NodeSet(vec![id])
    }

    pub fn is_nodeset(&self) -> bool {
        matches!(self, Value::NodeSet(_))
    }

    pub fn as_nodeset(&self) -> Option<&[NodeId]> {
        match self {
            Value::NodeSet(ns) => Some(ns),
            _ => None,
        }
    }

    /// True for any scalar, and for a node-set of size one whose only
    /// element is a leaf node.
    pub fn is_value(&self, doc: &Document) -> bool {
        match self {
            Value::NodeSet(ns) => ns.len() == 1 && doc.is_value(ns[0]),
            _ => true,
        }
    }

    pub fn get_node_set_size(&self) -> usize {
        match self {
            Value::NodeSet(ns) => ns.len(),
            _ => 1,
        }
    }

    pub fn get_number(&self, doc: &Document) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    f64::NAN
                } else {
                    t.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::NodeSet(ns) => match ns.first() {
                Some(id) => doc.get_string(*id).trim().parse::<f64>().unwrap_or(f64::NAN),
                None => f64::NAN,
            },
        }
    }

    pub fn get_boolean(&self) -> bool {
        match self {
            Value::Number(n) => !(*n == 0.0 || n.is_nan()),
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::NodeSet(ns) => !ns.is_empty(),
        }
    }

    /// Scalar string form; for a node-set, the string-value of the
    /// first node only ("" if empty).
    pub fn get_string(&self, doc: &Document) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::String(s) => s.clone(),
            Value::NodeSet(ns) => match ns.first() {
                Some(id) => doc.get_string(*id),
                None => String::new(),
            },
        }
    }

    /// For a node-set, concatenates the string-value of *every* node;
    /// identical to `get_string` for scalars.
    pub fn get_string_value(&self, doc: &Document) -> String {
        match self {
            Value::NodeSet(ns) => ns.iter().map(|id| doc.get_string(*id)).collect::<Vec<_>>().join(""),
            _ => self.get_string(doc),
        }
    }

    pub fn get_local_name(&self, doc: &Document) -> String {
        match self {
            Value::NodeSet(ns) => ns.first().map(|id| doc.name(*id)).unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Node-set consisting of the root of the first node; empty
    /// node-set if this isn't a node-set or is empty.
    pub fn get_root(&self, doc: &Document) -> Value {
        match self {
            Value::NodeSet(ns) => match ns.first() {
                Some(id) => Value::single_node(doc.get_root(*id)),
                None => Value::empty_nodeset(),
            },
            _ => Value::empty_nodeset(),
        }
    }

    pub fn node_set_union(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::NodeSet(l), Value::NodeSet(r)) => {
                let mut seen: HashSet<NodeId> = HashSet::with_capacity(l.len() + r.len());
                let mut out = Vec::with_capacity(l.len() + r.len());
                for id in l.iter().chain(r.iter()) {
                    if seen.insert(*id) {
                        out.push(*id);
                    }
                }
                Ok(Value::NodeSet(out))
            }
            _ => Err(Error::Type("union requires both operands to be node-sets".to_string())),
        }
    }

    /// `=` / `!=` per XPath: if either side is a node-set, true iff
    /// some element satisfies the relation against the other side
    /// (coerced to match); otherwise boolean-then-number-then-string
    /// comparison of the two scalars.
    pub fn xpath_eq(&self, other: &Value, doc: &Document, negate: bool) -> bool {
        let raw = match (self, other) {
            (Value::NodeSet(_), Value::NodeSet(_)) => self.nodeset_string_values(doc).iter().any(|l| {
                other.nodeset_string_values(doc).iter().any(|r| l == r)
            }),
            (Value::NodeSet(ns), other) => ns.iter().any(|id| Self::scalar_eq(&node_scalar(doc, *id, other), other, doc)),
            (other, Value::NodeSet(ns)) => ns.iter().any(|id| Self::scalar_eq(other, &node_scalar(doc, *id, other), doc)),
            (l, r) => Self::scalar_eq(l, r, doc),
        };
        if negate {
            !raw
        } else {
            raw
        }
    }

    fn nodeset_string_values(&self, doc: &Document) -> Vec<String> {
        match self {
            Value::NodeSet(ns) => ns.iter().map(|id| doc.get_string(*id)).collect(),
            _ => vec![self.get_string(doc)],
        }
    }

    fn scalar_eq(l: &Value, r: &Value, doc: &Document) -> bool {
        if matches!(l, Value::Boolean(_)) || matches!(r, Value::Boolean(_)) {
            l.get_boolean() == r.get_boolean()
        } else if matches!(l, Value::Number(_)) || matches!(r, Value::Number(_)) {
            l.get_number(doc) == r.get_number(doc)
        } else {
            l.get_string(doc) == r.get_string(doc)
        }
    }

    /// `<`, `<=`, `>`, `>=`: both operands must be scalars, or size-1
    /// node-sets of a primitive; compared as numbers.
    pub fn ordering_number(&self, doc: &Document) -> Result<f64> {
        match self {
            Value::NodeSet(ns) if ns.len() > 1 => {
                Err(Error::Type("ordering comparison requires a scalar or singleton node-set".to_string()))
            }
            _ => Ok(self.get_number(doc)),
        }
    }
}

/// Coerces a single node to the scalar type implied by `like`, for use
/// in a node-set/scalar equality comparison.
fn node_scalar(doc: &Document, id: NodeId, like: &Value) -> Value {
    match like {
        Value::Boolean(_) => Value::Boolean(doc.get_boolean(id)),
        Value::Number(_) => Value::Number(doc.get_number(id)),
        _ => Value::String(doc.get_string(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with(v: serde_json::Value) -> Document {
        Document::new(v)
    }

    #[test]
    fn boolean_coercion() {
        assert!(!Value::Number(0.0).get_boolean());
        assert!(!Value::Number(f64::NAN).get_boolean());
        assert!(Value::Number(1.0).get_boolean());
        assert!(!Value::String(String::new()).get_boolean());
        assert!(Value::String("x".into()).get_boolean());
        assert!(!Value::NodeSet(vec![]).get_boolean());
    }

    #[test]
    fn number_formatting_matches_xpath_canonical_form() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(3.5), "3.5");
    }

    #[test]
    fn node_set_union_dedupes_by_identity() {
        let a = Value::NodeSet(vec![1, 2]);
        let b = Value::NodeSet(vec![2, 3]);
        let u = a.node_set_union(&b).unwrap();
        assert_eq!(u.as_nodeset().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn union_requires_nodesets() {
        let a = Value::Number(1.0);
        let b = Value::NodeSet(vec![1]);
        assert!(a.node_set_union(&b).is_err());
    }

    #[test]
    fn nodeset_equality_checks_any_member() {
        let doc = doc_with(json!({"a": {"b": [1, 2, 3]}}));
        let root = doc.root_id();
        let a = doc.get_child(root, "a")[0];
        let bs = doc.get_child(a, "b");
        let v = Value::NodeSet(bs);
        assert!(v.xpath_eq(&Value::Number(2.0), &doc, false));
        assert!(!v.xpath_eq(&Value::Number(9.0), &doc, false));
    }
}
