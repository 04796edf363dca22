//! JSON-as-XML document - arena-based node tree
//!
//! The document owns every node in a single arena and materializes a
//! node's children only on first request, so constructing a `Document`
//! from a large JSON value only ever allocates the root.

use std::cell::RefCell;

use crate::value::format_number;

use super::node::{Node, NodeId, NodeKind};

pub struct Document {
    arena: RefCell<Vec<Node>>,
}

impl Document {
    pub fn new(json: serde_json::Value) -> Self {
        log::debug!("constructing document, root kind = {}", json_kind(&json));
        Document {
            arena: RefCell::new(vec![Node::root(json)]),
        }
    }

    pub fn root_id(&self) -> NodeId {
        0
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.arena.borrow()[id as usize].kind
    }

    pub fn name(&self, id: NodeId) -> String {
        self.arena.borrow()[id as usize].name.clone()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.borrow()[id as usize].parent
    }

    pub fn depth(&self, id: NodeId) -> u32 {
        self.arena.borrow()[id as usize].depth
    }

    pub fn value(&self, id: NodeId) -> serde_json::Value {
        self.arena.borrow()[id as usize].value.clone()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.arena.borrow()[id as usize].has_children()
    }

    pub fn is_value(&self, id: NodeId) -> bool {
        self.arena.borrow()[id as usize].is_value()
    }

    /// Materializes (if needed) and returns this node's direct
    /// children, in document order.
    pub fn get_children(&self, id: NodeId) -> Vec<NodeId> {
        if let Some(cached) = self.arena.borrow()[id as usize].children.clone() {
            return cached;
        }
        let (value, depth) = {
            let arena = self.arena.borrow();
            let node = &arena[id as usize];
            (node.value.clone(), node.depth)
        };
        let mut new_ids = Vec::new();
        if let serde_json::Value::Object(map) = value {
            for (key, v) in map.into_iter() {
                match v {
                    serde_json::Value::Array(items) => {
                        for item in items {
                            new_ids.push(self.push_child(id, key.clone(), item, depth + 1, true));
                        }
                    }
                    other => {
                        new_ids.push(self.push_child(id, key.clone(), other, depth + 1, false));
                    }
                }
            }
        }
        self.arena.borrow_mut()[id as usize].children = Some(new_ids.clone());
        new_ids
    }

    fn push_child(
        &self,
        parent: NodeId,
        name: String,
        value: serde_json::Value,
        depth: u32,
        is_array_child: bool,
    ) -> NodeId {
        let mut arena = self.arena.borrow_mut();
        let new_id = arena.len() as NodeId;
        arena.push(Node::child(parent, name, value, depth, is_array_child));
        new_id
    }

    pub fn get_child(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.get_children(id)
            .into_iter()
            .filter(|c| self.name(*c) == name)
            .collect()
    }

    /// Children first, then depth-first descendants of each child.
    pub fn get_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for c in self.get_children(id) {
            out.push(c);
            out.extend(self.get_subtree(c));
        }
        out
    }

    /// Descendants whose local name matches, in document order. Does
    /// not include `id` itself.
    pub fn search(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        for c in self.get_children(id) {
            if self.name(c) == name {
                out.push(c);
            }
            out.extend(self.search(c, name));
        }
        out
    }

    /// Strict ancestors, closest first.
    pub fn get_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = id;
        while let Some(p) = self.parent(cur) {
            out.push(p);
            cur = p;
        }
        out
    }

    pub fn get_root(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(p) = self.parent(cur) {
            cur = p;
        }
        cur
    }

    /// Siblings appearing later than `id` in the parent's child order.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let siblings = self.get_children(parent);
        match siblings.iter().position(|s| *s == id) {
            Some(idx) => siblings[idx + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    fn leaf_text(&self, id: NodeId) -> String {
        match self.value(id) {
            serde_json::Value::Null => String::new(),
            serde_json::Value::Bool(b) => if b { "true" } else { "false" }.to_string(),
            serde_json::Value::Number(n) => format_number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => s,
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => String::new(),
        }
    }

    /// The XML "string-value" of a node: its own text if it is a
    /// primitive, or the concatenation of the string-values of every
    /// descendant primitive in document order if it is composite.
    pub fn get_string(&self, id: NodeId) -> String {
        if self.has_children(id) {
            self.get_subtree(id)
                .into_iter()
                .filter(|d| !self.has_children(*d))
                .map(|d| self.leaf_text(d))
                .collect::<Vec<_>>()
                .join("")
        } else {
            self.leaf_text(id)
        }
    }

    pub fn get_number(&self, id: NodeId) -> f64 {
        if self.has_children(id) {
            return self.get_string(id).trim().parse::<f64>().unwrap_or(f64::NAN);
        }
        match self.value(id) {
            serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            serde_json::Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            serde_json::Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    f64::NAN
                } else {
                    t.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    pub fn get_boolean(&self, id: NodeId) -> bool {
        match self.value(id) {
            serde_json::Value::Number(n) => {
                let f = n.as_f64().unwrap_or(f64::NAN);
                !(f == 0.0 || f.is_nan())
            }
            serde_json::Value::Bool(b) => b,
            serde_json::Value::String(s) => !s.is_empty(),
            // Object or array, empty or not.
            serde_json::Value::Object(_) => true,
            serde_json::Value::Array(_) => true,
            serde_json::Value::Null => false,
        }
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
