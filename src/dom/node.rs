//! JSON-as-XML node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references into
//! the arena owned by `Document`.

/// Compact node identifier (index into the document's arena).
pub type NodeId = u32;

/// Which of the three projections a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A JSON object; children are the object's entries.
    Object,
    /// An element of a JSON array, flattened into a sibling of its
    /// own array field's key.
    ArrayChild,
    /// A JSON primitive (string, number, boolean, or null). Has no
    /// children.
    Leaf,
}

/// One node in the arena.
///
/// `value` holds this node's own JSON subtree. Cloning it out of the
/// parent's value when a child is materialized costs only the size of
/// that subtree, not the whole document, since sibling subtrees are
/// disjoint.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub name: String,
    pub value: serde_json::Value,
    pub depth: u32,
    /// Lazily materialized child ids, `None` until first requested.
    pub(crate) children: Option<Vec<NodeId>>,
}

impl Node {
    pub fn root(value: serde_json::Value) -> Self {
        let kind = Self::kind_of(&value);
        Node {
            kind,
            parent: None,
            name: String::new(),
            value,
            depth: 0,
            children: None,
        }
    }

    pub fn child(
        parent: NodeId,
        name: String,
        value: serde_json::Value,
        depth: u32,
        is_array_child: bool,
    ) -> Self {
        let kind = if is_array_child {
            NodeKind::ArrayChild
        } else {
            Self::kind_of(&value)
        };
        Node {
            kind,
            parent: Some(parent),
            name,
            value,
            depth,
            children: None,
        }
    }

    fn kind_of(value: &serde_json::Value) -> NodeKind {
        match value {
            serde_json::Value::Object(_) => NodeKind::Object,
            _ => NodeKind::Leaf,
        }
    }

    /// An array-child whose own value is a primitive is still a leaf
    /// for the purposes of `is_value`; an array-child wrapping an
    /// object has children of its own.
    #[inline]
    pub fn is_value(&self) -> bool {
        !matches!(self.value, serde_json::Value::Object(_))
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        matches!(self.value, serde_json::Value::Object(ref m) if !m.is_empty())
    }
}
