//! The public, parse-once expression type.

use crate::dom::Document;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::value::Value;
use crate::xpath::{self, Expr};

/// A parsed XPath expression, ready to be evaluated against any number
/// of environments without re-parsing.
#[derive(Debug, Clone)]
pub struct Expression {
    ast: Expr,
}

impl Expression {
    pub fn new(xpath: &str) -> Result<Expression> {
        let ast = xpath::parse(xpath).map_err(Error::Parse)?;
        log::debug!("parsed expression: {xpath}");
        Ok(Expression { ast })
    }

    /// Evaluates against `env`'s current value, at position 0.
    pub fn eval(&self, env: &Env<'_>) -> Result<Value> {
        xpath::eval(&self.ast, env, env.get_current(), 0, true)
    }
}

/// Convenience wrapper: parses `xpath` and evaluates it against
/// `document`'s root, in one call.
pub fn eval(xpath: &str, document: &Document) -> Result<Value> {
    let expr = Expression::new(xpath)?;
    let env = Env::new(document, Value::single_node(document.root_id()));
    expr.eval(&env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn convenience_wrapper_parses_and_evaluates() {
        let doc = Document::new(json!({"a": {"b": 1}}));
        let v = eval("/a/b", &doc).unwrap();
        assert_eq!(v.get_number(&doc), 1.0);
    }

    #[test]
    fn expression_can_be_reused_across_environments() {
        let doc = Document::new(json!({"a": {"b": [1, 2, 3]}}));
        let expr = Expression::new("count(/a/b)").unwrap();
        let env1 = Env::new(&doc, Value::single_node(doc.root_id()));
        let env2 = Env::new(&doc, Value::single_node(doc.root_id()));
        assert_eq!(expr.eval(&env1).unwrap(), expr.eval(&env2).unwrap());
    }

    #[test]
    fn parse_error_surfaces_immediately() {
        assert!(Expression::new("/a[").is_err());
    }
}
