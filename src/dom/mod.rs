//! DOM module - arena-based JSON-as-XML document
//!
//! A JSON value is walked lazily and exposed as an XML-like tree of
//! Object / ArrayChild / Leaf nodes, addressed by a stable `NodeId`
//! rather than a pointer, so that `Value` and `Env` never carry a
//! borrow tied to the document's lifetime.

pub mod document;
pub mod node;

pub use document::Document;
pub use node::{NodeId, NodeKind};
