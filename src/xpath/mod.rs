//! XPath 1.0 expression parsing and evaluation over a JSON document.
//!
//! This is a direct tree-walk: [`parser`] produces an [`parser::Expr`]
//! AST and [`eval`] recurses over it structurally, with no
//! intermediate bytecode or compiled representation. [`axes`] supplies
//! axis navigation, [`functions`] the core function library.

pub mod axes;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use eval::eval;
pub use parser::{parse, Axis, BinaryOp, Expr, NodeTest, Step};
