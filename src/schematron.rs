//! Schematron-style validation: patterns of rules, each asserting an
//! XPath test against a context node-set.
//!
//! Grounded on the reference `pattern`/`rule`/`assert` walk: aggregation
//! is a plain `&=` over every assertion, so a single run always
//! evaluates (and reports) every failure rather than stopping at the
//! first one.

use std::io::Write;

use crate::dom::Document;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::value::Value;

/// Walks `schematron` against `data`, writing one `<name>, error:
/// <message>` line to `out` per failed assertion. Returns true iff
/// every assertion held for every context node it was checked against.
pub fn eval(schematron: &serde_json::Value, data: &serde_json::Value, out: &mut dyn Write) -> Result<bool> {
    let pattern = get_field(schematron, "pattern", "schematron::eval")?;
    let doc = Document::new(data.clone());
    eval_one_or_many(pattern, "schematron::eval pattern", &doc, out, eval_pattern)
}

fn eval_pattern(pattern: &serde_json::Value, doc: &Document, out: &mut dyn Write) -> Result<bool> {
    let name = get_property_string(pattern, "name", "schematron::evalPattern")?;
    let rule = get_field(pattern, "rule", "schematron::evalPattern")?;
    eval_one_or_many(rule, "schematron::evalPattern rule", doc, out, |rule, doc, out| {
        eval_rule(&name, rule, doc, out)
    })
}

fn eval_rule(name: &str, rule: &serde_json::Value, doc: &Document, out: &mut dyn Write) -> Result<bool> {
    let ctx = get_property_string(rule, "context", "schematron::evalRule")?;
    let ctx_expr = Expression::new(&ctx)?;
    let root_env = Env::new(doc, Value::single_node(doc.root_id()));
    let context = ctx_expr.eval(&root_env)?;

    let assert = get_field(rule, "assert", "schematron::evalRule")?;
    eval_one_or_many(assert, "schematron::evalRule assert", doc, out, |a, doc, out| {
        eval_assert(name, &context, a, doc, out)
    })
}

fn eval_assert(name: &str, context: &Value, assert: &serde_json::Value, doc: &Document, out: &mut dyn Write) -> Result<bool> {
    let test = get_property_string(assert, "test", "schematron::evalAssert")?;
    let message = get_property_string(assert, "message", "schematron::evalAssert")?;
    let expr = Expression::new(&test)?;

    let mut result = true;
    if let Value::NodeSet(ids) = context {
        for id in ids {
            let env = Env::new(doc, Value::single_node(*id));
            result &= eval_expression(&expr, &env, name, &message, out)?;
        }
    } else {
        let env = Env::new(doc, context.clone());
        result = eval_expression(&expr, &env, name, &message, out)?;
    }
    Ok(result)
}

fn eval_expression(expr: &Expression, env: &Env<'_>, name: &str, message: &str, out: &mut dyn Write) -> Result<bool> {
    let r = expr.eval(env)?;
    let result = r.get_boolean();
    if !result {
        log::warn!("{name}: assertion failed: {message}");
        writeln!(out, "{name}, error: {message}").map_err(|e| Error::Io(e.to_string()))?;
    }
    Ok(result)
}

/// `json[field]` may be a single object or an array of objects; runs
/// `f` over each, AND-accumulating the result without short-circuit.
fn eval_one_or_many<F>(value: &serde_json::Value, context: &str, doc: &Document, out: &mut dyn Write, f: F) -> Result<bool>
where
    F: Fn(&serde_json::Value, &Document, &mut dyn Write) -> Result<bool>,
{
    if value.is_object() {
        f(value, doc, out)
    } else if let Some(arr) = value.as_array() {
        if arr.is_empty() {
            return Err(Error::Schema(format!("{context} array is empty")));
        }
        let mut result = true;
        for item in arr {
            if !item.is_object() {
                return Err(Error::Schema(format!("{context} entry is not an object")));
            }
            result &= f(item, doc, out)?;
        }
        Ok(result)
    } else {
        Err(Error::Schema(format!("{context} is not an object or array")))
    }
}

fn get_field<'a>(json: &'a serde_json::Value, name: &str, context: &str) -> Result<&'a serde_json::Value> {
    json.get(name).ok_or_else(|| Error::Schema(format!("{context} can not find {name}")))
}

fn get_property_string(json: &serde_json::Value, name: &str, context: &str) -> Result<String> {
    let field = get_field(json, name, context)?;
    field
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Schema(format!("{context} {name} is not a string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_pattern_passes_silently() {
        let schema = json!({"pattern": {"name": "p1", "rule": {"context": "/", "assert": {"test": "count(a)=1", "message": "need exactly one a"}}}});
        let data = json!({"a": 3});
        let mut out = Vec::new();
        let ok = eval(&schema, &data, &mut out).unwrap();
        assert!(ok);
        assert!(out.is_empty());
    }

    #[test]
    fn failing_assertion_writes_diagnostic() {
        let schema = json!({"pattern": {"name": "p1", "rule": {"context": "/", "assert": {"test": "count(a)=2", "message": "need two a"}}}});
        let data = json!({"a": 3});
        let mut out = Vec::new();
        let ok = eval(&schema, &data, &mut out).unwrap();
        assert!(!ok);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "p1, error: need two a\n");
    }

    #[test]
    fn both_asserts_evaluate_even_when_first_fails() {
        let schema = json!({
            "pattern": {
                "name": "p1",
                "rule": {
                    "context": "/",
                    "assert": [
                        {"test": "count(a) = 99", "message": "first"},
                        {"test": "count(a) = 98", "message": "second"}
                    ]
                }
            }
        });
        let data = json!({"a": 3});
        let mut out = Vec::new();
        let ok = eval(&schema, &data, &mut out).unwrap();
        assert!(!ok);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn missing_pattern_is_a_schema_error() {
        let schema = json!({});
        let data = json!({});
        let mut out = Vec::new();
        assert!(matches!(eval(&schema, &data, &mut out), Err(Error::Schema(_))));
    }

    #[test]
    fn per_node_context_checks_every_match() {
        let schema = json!({"pattern": {"name": "p1", "rule": {"context": "//b", "assert": {"test": ". > 0", "message": "must be positive"}}}});
        let data = json!({"a": {"b": [1, -2, 3]}});
        let mut out = Vec::new();
        let ok = eval(&schema, &data, &mut out).unwrap();
        assert!(!ok);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
