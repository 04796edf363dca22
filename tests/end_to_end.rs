//! End-to-end scenarios exercised through the public API only:
//! `Document`, `Expression`, `Env`, `schematron::eval`.

use jstr::{eval, Document, Env, Expression, Value};
use serde_json::json;

fn eval_str(doc: &Document, xpath: &str) -> Value {
    eval(xpath, doc).unwrap()
}

#[test]
fn counts_sums_and_positional_predicates_over_an_array() {
    let doc = Document::new(json!({"a": {"b": [1, 2, 3]}}));
    assert_eq!(eval_str(&doc, "count(/a/b)").get_number(&doc), 3.0);
    assert_eq!(eval_str(&doc, "sum(/a/b)").get_number(&doc), 6.0);
    assert_eq!(eval_str(&doc, "/a/b[2]").get_number(&doc), 2.0);
    assert_eq!(eval_str(&doc, "/a/b[last()]").get_number(&doc), 3.0);
    assert_eq!(eval_str(&doc, "count(/a/b[. > 1])").get_number(&doc), 2.0);
}

#[test]
fn descendant_operator_and_ancestor_axis_over_a_shared_structure() {
    let doc = Document::new(json!({"a": {"b": {"c": {"e": 1}}, "d": {"c": {"e": 1}}}}));
    assert_eq!(eval_str(&doc, "count(//e)").get_number(&doc), 2.0);
    assert_eq!(eval_str(&doc, "local-name(//b/..)").get_string(&doc), "a");
    assert_eq!(eval_str(&doc, "count(//e/ancestor::*)").get_number(&doc), 6.0);
    assert!(eval_str(&doc, "/a/b/c = /a/d/c").get_boolean());
}

#[test]
fn union_concatenates_string_values_in_operand_order() {
    let doc = Document::new(json!({"a": {"b": 1, "c": true, "d": "foo"}}));
    let v = eval_str(&doc, "/a/b | /a/c | /a/d");
    assert_eq!(v.get_string_value(&doc), "1truefoo");
    assert_eq!(eval_str(&doc, "string(/a)").get_string(&doc), "1truefoo");
}

#[test]
fn division_and_substring_edge_cases() {
    let doc = Document::new(json!({}));
    assert_eq!(eval_str(&doc, "4 div 0").get_string(&doc), "Infinity");
    assert_eq!(eval_str(&doc, "0 div 0").get_string(&doc), "NaN");
    assert_eq!(eval_str(&doc, "substring('12345', 0 div 0, 3)").get_string(&doc), "");
    assert_eq!(eval_str(&doc, "substring('12345', -42, 1 div 0)").get_string(&doc), "12345");
}

#[test]
fn variables_and_current_bind_across_environments() {
    let doc1 = Document::new(json!({"a": {"b": [1, 2, 3, 4]}}));
    let b1 = eval("/a/b[. = 1]", &doc1).unwrap();
    let b4 = eval("/a/b[. = 4]", &doc1).unwrap();

    let expr = Expression::new("$b1 + 3 = $b4").unwrap();
    let mut env = Env::new(&doc1, Value::single_node(doc1.root_id()));
    env.add_variable("b1", b1).unwrap();
    env.add_variable("b4", b4).unwrap();
    assert!(expr.eval(&env).unwrap().get_boolean());

    let doc2 = Document::new(json!({"a": {"b": {"c": {"e": 1}}, "d": {"c": {"e": 1}}}}));
    let current = eval("//d", &doc2).unwrap();
    let env2 = Env::new(&doc2, current);
    let count_expr = Expression::new("count(current()//e)").unwrap();
    assert_eq!(count_expr.eval(&env2).unwrap().get_number(&doc2), 1.0);
}

#[test]
fn schematron_passes_silently_when_the_assertion_holds() {
    let schema = json!({"pattern": {"name": "p1", "rule": {"context": "/", "assert": {"test": "count(a)=1", "message": "need exactly one a"}}}});
    let data = json!({"a": 3});
    let mut out = Vec::new();
    assert!(jstr::schematron::eval(&schema, &data, &mut out).unwrap());
    assert!(out.is_empty());
}

#[test]
fn schematron_reports_one_diagnostic_on_a_single_failure() {
    let schema = json!({"pattern": {"name": "p1", "rule": {"context": "/", "assert": {"test": "count(a)=2", "message": "need two a"}}}});
    let data = json!({"a": 3});
    let mut out = Vec::new();
    assert!(!jstr::schematron::eval(&schema, &data, &mut out).unwrap());
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
}

#[test]
fn schematron_does_not_short_circuit_across_asserts() {
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
    assert!(!jstr::schematron::eval(&schema, &data, &mut out).unwrap());
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
}

#[test]
fn not_not_round_trips_to_boolean_coercion() {
    let doc = Document::new(json!({"a": "x"}));
    let lhs = eval_str(&doc, "not(not(/a))").get_boolean();
    let rhs = eval_str(&doc, "boolean(/a)").get_boolean();
    assert_eq!(lhs, rhs);
}

#[test]
fn descendant_operator_excludes_self_for_self_and_parent_steps() {
    let doc = Document::new(json!({"a": {"b": {"c": 1}}}));
    // `//parent::a` only matches descendants of `a/b` whose parent is an
    // `a`; `b` itself is never considered, so this is empty.
    assert_eq!(eval_str(&doc, "count(/a/b//parent::a)").get_number(&doc), 0.0);
    assert_eq!(eval_str(&doc, "count(/a/b//self::b)").get_number(&doc), 0.0);
}

#[test]
fn predicate_context_position_is_independent_of_loop_index() {
    let doc = Document::new(json!({"a": {"b": [{"c": 1}, {"c": 2}, {"c": 3}]}}));
    // Every candidate but the first exercises the case where a
    // predicate's single-node context must not be indexed by its
    // position in the wider candidate set.
    assert_eq!(eval_str(&doc, "count(/a/b[./c > 1])").get_number(&doc), 2.0);
    assert_eq!(eval_str(&doc, "count(/a/b[c])").get_number(&doc), 3.0);
}

#[test]
fn parent_abbreviation_is_a_valid_non_initial_step() {
    let doc = Document::new(json!({"a": {"b": {"c": 1}}}));
    assert_eq!(eval_str(&doc, "local-name(/a/b/..)").get_string(&doc), "a");
    assert_eq!(eval_str(&doc, "local-name(/a/b/c/../../..)").get_string(&doc), "");
}

#[test]
fn node_set_union_with_itself_is_idempotent() {
    let doc = Document::new(json!({"a": {"b": [1, 2, 3]}}));
    let count_ns = eval_str(&doc, "count(/a/b)").get_number(&doc);
    let count_union = eval_str(&doc, "count(/a/b | /a/b)").get_number(&doc);
    assert_eq!(count_ns, count_union);
}
