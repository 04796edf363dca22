//! Tree-walk evaluator.
//!
//! Each [`Expr`] variant evaluates itself against an [`Env`] (which
//! carries the document), a context [`Value`], a zero-based `pos`, and
//! a `first_step` flag. There is no intermediate bytecode or stack
//! machine: `eval` recurses structurally over the AST produced by
//! [`super::parser`].
//!
//! `first_step` distinguishes two ways a location step can consume its
//! incoming context: applied only to the single node at `context[pos]`
//! (the step immediately following a path's starting point), or
//! applied to every node of the incoming node-set and merged (any
//! later step in the same path). [`eval_path`] is the only place that
//! decides which applies; every other caller re-enters a fresh
//! sub-expression with `first_step = true`.

use std::collections::HashSet;

use crate::dom::{Document, NodeId};
use crate::env::Env;
use crate::error::{Error, Result};
use crate::value::Value;

use super::axes;
use super::functions;
use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};

/// Evaluates `expr` against `context` (the node or scalar currently
/// under consideration), at position `pos` within whatever node-set it
/// was drawn from.
pub fn eval(expr: &Expr, env: &Env<'_>, context: &Value, pos: usize, first_step: bool) -> Result<Value> {
    let doc = env.doc();
    match expr {
        Expr::Root => Ok(env.get_root()?.clone()),
        Expr::Context => eval_self(doc, context, first_step, pos),
        Expr::Parent => eval_parent(doc, context, first_step, pos),
        Expr::Union(l, r) => {
            let lv = eval(l, env, context, pos, true)?;
            let rv = eval(r, env, context, pos, true)?;
            lv.node_set_union(&rv)
        }
        Expr::Path(left, step) => eval_path(left, step, env, context, pos),
        Expr::Filter(base, pred) => {
            let base_val = eval(base, env, context, pos, true)?;
            apply_predicate_to_value(pred, env, base_val)
        }
        Expr::Function(name, args) => functions::call(name, args, env, context, pos, first_step),
        Expr::Binary(l, op, r) => eval_binary(l, *op, r, env, context, pos),
        Expr::Negate(e) => {
            let v = eval(e, env, context, pos, true)?;
            Ok(Value::Number(-v.get_number(doc)))
        }
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Variable(name) => env.get_variable(name).cloned(),
        Expr::Step(step) => eval_step(step, env, context, pos, first_step),
    }
}

/// "." — passes a non-node-set context through unchanged; otherwise
/// behaves as a `self::node()` step with no predicates.
fn eval_self(doc: &Document, context: &Value, first_step: bool, pos: usize) -> Result<Value> {
    if !context.is_nodeset() {
        return Ok(context.clone());
    }
    let step = Step { axis: Axis::Self_, node_test: NodeTest::Any, predicates: Vec::new() };
    navigate_step(&step, doc, context, first_step, pos)
}

/// ".." — same passthrough quirk as `eval_self`, over the parent axis.
fn eval_parent(doc: &Document, context: &Value, first_step: bool, pos: usize) -> Result<Value> {
    if !context.is_nodeset() {
        return Ok(context.clone());
    }
    let step = Step { axis: Axis::Parent, node_test: NodeTest::Any, predicates: Vec::new() };
    navigate_step(&step, doc, context, first_step, pos)
}

fn eval_path(left: &Expr, step: &Step, env: &Env<'_>, context: &Value, pos: usize) -> Result<Value> {
    // `left` is always evaluated as a fresh sub-expression: it is
    // either the trivial anchor (Root/Context) or a nested Path that
    // has already resolved its own internal step sequencing.
    let left_val = eval(left, env, context, pos, true)?;
    let step_is_first = matches!(left, Expr::Root | Expr::Context);
    eval_step(step, env, &left_val, 0, step_is_first)
}

fn eval_step(step: &Step, env: &Env<'_>, context: &Value, pos: usize, first_step: bool) -> Result<Value> {
    let doc = env.doc();
    if !context.is_nodeset() {
        if step.axis == Axis::Self_ && step.predicates.is_empty() {
            return Ok(context.clone());
        }
        return Err(Error::Type("a location step requires a node-set context".to_string()));
    }
    let candidates = navigate_step(step, doc, context, first_step, pos)?;
    let Value::NodeSet(ids) = candidates else {
        unreachable!("navigate_step always returns a node-set for a node-set context");
    };
    let filtered = apply_predicates_to_nodeset(&step.predicates, env, ids)?;
    Ok(Value::NodeSet(filtered))
}

/// Axis navigation and node-test filtering for a step, without
/// applying its predicates — shared by `eval_step` and the synthetic
/// self/parent steps behind "." and "..".
fn navigate_step(step: &Step, doc: &Document, context: &Value, first_step: bool, pos: usize) -> Result<Value> {
    let bases: Vec<NodeId> = match context {
        // `pos` only ever needs to pick one node out of a multi-node
        // context; a context already narrowed to a single node (as it
        // is for every predicate candidate, where `pos` instead carries
        // that candidate's position for `position()`/`last()`) is used
        // whole regardless of `pos`.
        Value::NodeSet(ns) if first_step && ns.len() > 1 => ns.get(pos).copied().into_iter().collect(),
        Value::NodeSet(ns) => ns.clone(),
        _ => return Err(Error::Type("a location step requires a node-set context".to_string())),
    };

    let mut raw = Vec::new();
    for base in &bases {
        for candidate in axes::navigate(doc, *base, step.axis)? {
            if axes::matches_node_test(doc, candidate, &step.node_test) {
                raw.push(candidate);
            }
        }
    }

    let deduped = dedupe(raw);
    let ordered = if forward_ordered(step.axis) && bases.len() > 1 {
        sort_document_order(doc, deduped)
    } else {
        deduped
    };
    Ok(Value::NodeSet(ordered))
}

fn dedupe(raw: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for id in raw {
        if seen.insert(id) {
            out.push(id);
        }
    }
    out
}

/// Whether an axis's natural iteration order is forward document
/// order, as opposed to the reverse order XPath mandates for
/// `ancestor`/`ancestor-or-self`/`parent`/`preceding-sibling`.
fn forward_ordered(axis: Axis) -> bool {
    matches!(
        axis,
        Axis::Child | Axis::Descendant | Axis::DescendantOrSelf | Axis::FollowingSibling | Axis::Self_
    )
}

fn document_path(doc: &Document, id: NodeId) -> Vec<usize> {
    let mut path = Vec::new();
    let mut cur = id;
    while let Some(parent) = doc.parent(cur) {
        let siblings = doc.get_children(parent);
        let idx = siblings.iter().position(|s| *s == cur).unwrap_or(0);
        path.push(idx);
        cur = parent;
    }
    path.reverse();
    path
}

fn sort_document_order(doc: &Document, mut ids: Vec<NodeId>) -> Vec<NodeId> {
    ids.sort_by_key(|id| document_path(doc, *id));
    ids
}

/// Runs `predicates` in sequence against a candidate node-set,
/// narrowing it at each step. `last()`/`position()` resolve against
/// the full candidate set at the current predicate stage, not against
/// the single node under test.
pub fn apply_predicates_to_nodeset(predicates: &[Expr], env: &Env<'_>, candidates: Vec<NodeId>) -> Result<Vec<NodeId>> {
    let mut current = candidates;
    for pred in predicates {
        let full_set = Value::NodeSet(current.clone());
        let pred_env = env.with_current(full_set);
        let mut next = Vec::with_capacity(current.len());
        for (i, id) in current.iter().enumerate() {
            let node_context = Value::single_node(*id);
            let pred_val = eval(pred, &pred_env, &node_context, i, true)?;
            if predicate_survives(&pred_val, i) {
                next.push(*id);
            }
        }
        current = next;
    }
    Ok(current)
}

fn predicate_survives(value: &Value, index: usize) -> bool {
    match value {
        Value::Number(n) => (index as f64 + 1.0) == *n,
        other => other.get_boolean(),
    }
}

/// Applies a single predicate to an arbitrary value (used by
/// `Expr::Filter`, whose base expression need not be a location step).
/// A node-set base is filtered exactly as a step's predicates would be;
/// a scalar base is evaluated once at position 0 and kept or dropped
/// whole.
fn apply_predicate_to_value(pred: &Expr, env: &Env<'_>, value: Value) -> Result<Value> {
    match value {
        Value::NodeSet(ns) => {
            let filtered = apply_predicates_to_nodeset(std::slice::from_ref(pred), env, ns)?;
            Ok(Value::NodeSet(filtered))
        }
        other => {
            let pred_val = eval(pred, env, &other, 0, true)?;
            if predicate_survives(&pred_val, 0) {
                Ok(other)
            } else {
                Ok(Value::empty_nodeset())
            }
        }
    }
}

fn eval_binary(l: &Expr, op: BinaryOp, r: &Expr, env: &Env<'_>, context: &Value, pos: usize) -> Result<Value> {
    let doc = env.doc();
    match op {
        // `or`/`and` short-circuit: a divergence from the XPath
        // reference engine this evaluator descends from, which always
        // evaluates both sides.
        BinaryOp::Or => {
            let lv = eval(l, env, context, pos, true)?;
            if lv.get_boolean() {
                return Ok(Value::Boolean(true));
            }
            let rv = eval(r, env, context, pos, true)?;
            Ok(Value::Boolean(rv.get_boolean()))
        }
        BinaryOp::And => {
            let lv = eval(l, env, context, pos, true)?;
            if !lv.get_boolean() {
                return Ok(Value::Boolean(false));
            }
            let rv = eval(r, env, context, pos, true)?;
            Ok(Value::Boolean(rv.get_boolean()))
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            let lv = eval(l, env, context, pos, true)?;
            let rv = eval(r, env, context, pos, true)?;
            Ok(Value::Boolean(lv.xpath_eq(&rv, doc, op == BinaryOp::NotEq)))
        }
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let lv = eval(l, env, context, pos, true)?;
            let rv = eval(r, env, context, pos, true)?;
            let ln = lv.ordering_number(doc)?;
            let rn = rv.ordering_number(doc)?;
            let result = match op {
                BinaryOp::Lt => ln < rn,
                BinaryOp::LtEq => ln <= rn,
                BinaryOp::Gt => ln > rn,
                BinaryOp::GtEq => ln >= rn,
                _ => unreachable!(),
            };
            Ok(Value::Boolean(result))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let lv = eval(l, env, context, pos, true)?;
            let rv = eval(r, env, context, pos, true)?;
            let ln = lv.get_number(doc);
            let rn = rv.get_number(doc);
            let result = match op {
                BinaryOp::Add => ln + rn,
                BinaryOp::Sub => ln - rn,
                BinaryOp::Mul => ln * rn,
                BinaryOp::Div => ln / rn,
                // Rust's `%` truncates toward zero, matching the
                // reference engine's `static_cast<int64_t>` modulo:
                // `5 mod -2 == 1`, not `-1`.
                BinaryOp::Mod => ln % rn,
                _ => unreachable!(),
            };
            Ok(Value::Number(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::parser::parse;
    use serde_json::json;

    fn eval_xpath(doc: &Document, xpath: &str) -> Value {
        let expr = parse(xpath).unwrap();
        let env = Env::new(doc, Value::single_node(doc.root_id()));
        eval(&expr, &env, env.get_current(), 0, true).unwrap()
    }

    #[test]
    fn child_step_selects_named_children() {
        let doc = Document::new(json!({"a": {"b": 1, "c": 2}}));
        let v = eval_xpath(&doc, "/a/b");
        assert_eq!(v.get_number(&doc), 1.0);
    }

    #[test]
    fn descendant_operator_finds_nested_nodes() {
        let doc = Document::new(json!({"a": {"b": {"e": 1}}, "c": {"e": 2}}));
        let v = eval_xpath(&doc, "//e");
        assert_eq!(v.get_node_set_size(), 2);
    }

    #[test]
    fn numeric_predicate_selects_by_position() {
        let doc = Document::new(json!({"a": [10, 20, 30]}));
        let v = eval_xpath(&doc, "/a[2]");
        assert_eq!(v.get_number(&doc), 20.0);
    }

    #[test]
    fn and_short_circuits_without_evaluating_right_side() {
        let doc = Document::new(json!({}));
        let v = eval_xpath(&doc, "false() and (1 div 0 = 1 div 0)");
        assert_eq!(v, Value::Boolean(false));
    }

    #[test]
    fn mod_truncates_toward_zero() {
        let doc = Document::new(json!({}));
        let v = eval_xpath(&doc, "5 mod -2");
        assert_eq!(v.get_number(&doc), 1.0);
    }

    #[test]
    fn union_dedupes_overlapping_node_sets() {
        let doc = Document::new(json!({"a": {"b": 1, "c": 2}}));
        let v = eval_xpath(&doc, "/a/b | /a/b | /a/c");
        assert_eq!(v.get_node_set_size(), 2);
    }
}
