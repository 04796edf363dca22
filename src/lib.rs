//! XPath 1.0 expression evaluation and Schematron-style validation over
//! JSON documents.
//!
//! A [`Document`] projects a `serde_json::Value` into an XML-like node
//! tree (objects and array elements become element-like nodes, scalars
//! become text nodes). An [`Expression`] is a parsed XPath 1.0 query,
//! evaluated against an [`Env`] with [`Expression::eval`]. [`schematron`]
//! layers a pattern/rule/assert validation driver on top of the same
//! evaluator.

pub mod dom;
pub mod env;
pub mod error;
pub mod expression;
pub mod schematron;
pub mod value;
pub mod xpath;

pub use dom::{Document, NodeId};
pub use env::Env;
pub use error::{Error, Result};
pub use expression::{eval, Expression};
pub use value::Value;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
