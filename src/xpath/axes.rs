//! XPath axis navigation over the JSON node tree.
//!
//! Only the axes the projected tree actually has a meaning for are
//! implemented: child, descendant, descendant-or-self, parent,
//! ancestor, ancestor-or-self, following-sibling, self. There are no
//! attribute or namespace nodes, and no `following`/`preceding`
//! axes — asking for one is a [`Error::Type`] failure rather than a
//! silent empty result, so a typo in an axis name doesn't read as "no
//! matches."

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

use super::parser::{Axis, NodeTest};

/// Produces the candidate nodes for `axis` from `context`, before any
/// node-test filtering or predicate application.
pub fn navigate(doc: &Document, context: NodeId, axis: Axis) -> Result<Vec<NodeId>> {
    log::trace!("axis {:?} from node {}", axis, context);
    match axis {
        Axis::Child => Ok(doc.get_children(context)),
        Axis::Descendant => Ok(doc.get_subtree(context)),
        Axis::DescendantOrSelf => {
            let mut out = vec![context];
            out.extend(doc.get_subtree(context));
            Ok(out)
        }
        Axis::Parent => Ok(doc.parent(context).into_iter().collect()),
        Axis::Ancestor => Ok(doc.get_ancestors(context)),
        Axis::AncestorOrSelf => {
            let mut out = vec![context];
            out.extend(doc.get_ancestors(context));
            Ok(out)
        }
        Axis::FollowingSibling => Ok(doc.following_siblings(context)),
        Axis::Self_ => Ok(vec![context]),
        Axis::PrecedingSibling | Axis::Following | Axis::Preceding => {
            Err(Error::Type(format!("{axis:?} axis is not supported")))
        }
        Axis::Attribute | Axis::Namespace => {
            Err(Error::Type(format!("{axis:?} axis has no nodes in this tree model")))
        }
    }
}

/// Whether `node_id` satisfies a step's node test.
pub fn matches_node_test(doc: &Document, node_id: NodeId, test: &NodeTest) -> bool {
    match test {
        NodeTest::Any | NodeTest::Node => true,
        NodeTest::Name(name) => doc.name(node_id) == *name,
        NodeTest::Text => doc.is_value(node_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn child_axis_returns_all_children() {
        let doc = Document::new(json!({"a": {"x": 1, "y": 2}}));
        let root = doc.root_id();
        let a = doc.get_child(root, "a")[0];
        assert_eq!(navigate(&doc, a, Axis::Child).unwrap().len(), 2);
    }

    #[test]
    fn descendant_or_self_prepends_context() {
        let doc = Document::new(json!({"a": {"b": 1}}));
        let root = doc.root_id();
        let out = navigate(&doc, root, Axis::DescendantOrSelf).unwrap();
        assert_eq!(out[0], root);
        assert_eq!(out.len(), 3); // root, a, b
    }

    #[test]
    fn following_axis_is_unsupported() {
        let doc = Document::new(json!({}));
        let root = doc.root_id();
        assert!(navigate(&doc, root, Axis::Following).is_err());
    }

    #[test]
    fn node_test_any_matches_every_kind() {
        let doc = Document::new(json!({"a": 1}));
        let root = doc.root_id();
        let a = doc.get_child(root, "a")[0];
        assert!(matches_node_test(&doc, a, &NodeTest::Any));
        assert!(matches_node_test(&doc, a, &NodeTest::Text));
    }
}
