//! Error taxonomy shared by the node tree, the evaluator, the function
//! library and the Schematron driver.

use thiserror::Error;

/// A single closed error type for everything that can go wrong while
/// parsing or evaluating an expression, or while walking a schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Syntactic failure while lexing or parsing an XPath expression.
    #[error("parse error: {0}")]
    Parse(String),

    /// An operation was applied to a value of the wrong type (ordering
    /// comparison on a non-scalar, union of a non-node-set, etc).
    #[error("type error: {0}")]
    Type(String),

    /// A function was called with the wrong number of arguments.
    #[error("arity error: {0}")]
    Arity(String),

    /// An unknown function or variable name was referenced.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// The root was required but the environment was built from a
    /// context that carries no root.
    #[error("missing root: {0}")]
    Missing(String),

    /// Malformed Schematron or data JSON.
    #[error("schema error: {0}")]
    Schema(String),

    /// IO or JSON-parsing failure at the CLI boundary.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
