//! Evaluation context: the current value, a cached root, and variable
//! bindings.

use std::collections::HashMap;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Clone)]
pub struct Env<'a> {
    doc: &'a Document,
    current: Value,
    root: Option<Value>,
    variables: HashMap<String, Value>,
}

impl<'a> Env<'a> {
    /// Builds an environment over `doc`, rooted at `current`. If
    /// `current` is a non-empty node-set, the root is the root of its
    /// first node; a scalar or empty context carries no root at all.
    pub fn new(doc: &'a Document, current: Value) -> Env<'a> {
        let root = match &current {
            Value::NodeSet(ns) if !ns.is_empty() => Some(current.get_root(doc)),
            _ => None,
        };
        Env {
            doc,
            current,
            root,
            variables: HashMap::new(),
        }
    }

    /// A derived environment sharing this one's document, root and
    /// variable bindings but with a different current value — used
    /// while filtering a step's candidates through its predicates,
    /// where `position()`/`last()` must resolve against the full
    /// candidate set rather than the single node under test.
    pub fn with_current(&self, current: Value) -> Env<'a> {
        Env {
            doc: self.doc,
            current,
            root: self.root.clone(),
            variables: self.variables.clone(),
        }
    }

    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    pub fn get_current(&self) -> &Value {
        &self.current
    }

    pub fn get_root(&self) -> Result<&Value> {
        self.root
            .as_ref()
            .ok_or_else(|| Error::Missing("environment has no root: context was not a node-set".to_string()))
    }

    pub fn add_variable(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return Err(Error::Lookup(format!("variable '{name}' is already bound")));
        }
        self.variables.insert(name, value);
        Ok(())
    }

    pub fn get_variable(&self, name: &str) -> Result<&Value> {
        self.variables
            .get(name)
            .ok_or_else(|| Error::Lookup(format!("unbound variable '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;
    use serde_json::json;

    #[test]
    fn root_is_missing_for_scalar_context() {
        let doc = Document::new(json!({}));
        let env = Env::new(&doc, Value::Number(1.0));
        assert!(env.get_root().is_err());
    }

    #[test]
    fn root_is_available_for_node_context() {
        let doc = Document::new(json!({"a": 1}));
        let root_id: NodeId = doc.root_id();
        let env = Env::new(&doc, Value::single_node(root_id));
        assert!(env.get_root().is_ok());
    }

    #[test]
    fn variable_cannot_be_rebound() {
        let doc = Document::new(json!({}));
        let mut env = Env::new(&doc, Value::Number(1.0));
        env.add_variable("x", Value::Number(1.0)).unwrap();
        assert!(env.add_variable("x", Value::Number(2.0)).is_err());
    }

    #[test]
    fn unbound_variable_fails() {
        let doc = Document::new(json!({}));
        let env = Env::new(&doc, Value::Number(1.0));
        assert!(env.get_variable("y").is_err());
    }
}
