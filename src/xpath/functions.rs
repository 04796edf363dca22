//! XPath 1.0 core function library.
//!
//! Implements the subset of the core function library that makes
//! sense over a tree with no attribute or namespace nodes:
//!
//! Node-set: `position()`, `last()`, `count()`, `local-name()`, `current()`
//! String: `string()`, `concat()`, `starts-with()`, `contains()`,
//!   `substring()`, `substring-before()`, `substring-after()`,
//!   `string-length()`, `normalize-space()`, `translate()`
//! Boolean: `boolean()`, `not()`, `true()`, `false()`
//! Number: `number()`, `sum()`, `floor()`, `ceiling()`, `round()`
//!
//! `id()`, `name()`, `namespace-uri()` and `lang()` have no counterpart
//! in this tree model and are rejected with an explicit error rather
//! than silently returning an empty result.

use crate::env::Env;
use crate::error::{Error, Result};
use crate::value::Value;

use super::eval::eval;
use super::parser::Expr;

/// Dispatches a function call. Arguments are unevaluated expressions;
/// most functions evaluate them eagerly against `context`/`pos`, but
/// `position()` and `last()` need no arguments at all and read `pos`
/// and `env`'s current value directly.
pub fn call(name: &str, args: &[Expr], env: &Env<'_>, context: &Value, pos: usize, first_step: bool) -> Result<Value> {
    let _ = first_step;
    let doc = env.doc();
    match name {
        "position" => {
            check_arity(name, args, 0, 0)?;
            Ok(Value::Number(pos as f64 + 1.0))
        }
        "last" => {
            check_arity(name, args, 0, 0)?;
            Ok(Value::Number(env.get_current().get_node_set_size() as f64))
        }
        "count" => {
            check_arity(name, args, 1, 1)?;
            match eval_arg(args, 0, env, context, pos)? {
                Value::NodeSet(ns) => Ok(Value::Number(ns.len() as f64)),
                _ => Err(Error::Type("count() requires a node-set argument".to_string())),
            }
        }
        "local-name" => {
            check_arity(name, args, 0, 1)?;
            let v = if args.is_empty() { context.clone() } else { eval_arg(args, 0, env, context, pos)? };
            Ok(Value::String(v.get_local_name(doc)))
        }
        "current" => {
            check_arity(name, args, 0, 0)?;
            Ok(env.get_current().clone())
        }
        "id" => Err(Error::Lookup("id() has no counterpart in this tree model".to_string())),

        "string" => {
            check_arity(name, args, 0, 1)?;
            let v = if args.is_empty() { context.clone() } else { eval_arg(args, 0, env, context, pos)? };
            Ok(Value::String(v.get_string(doc)))
        }
        "concat" => {
            if args.len() < 2 {
                return Err(Error::Arity("concat() requires at least 2 arguments".to_string()));
            }
            let mut out = String::new();
            for i in 0..args.len() {
                out.push_str(&eval_arg(args, i, env, context, pos)?.get_string(doc));
            }
            Ok(Value::String(out))
        }
        "starts-with" => {
            check_arity(name, args, 2, 2)?;
            let s = eval_arg(args, 0, env, context, pos)?.get_string(doc);
            let prefix = eval_arg(args, 1, env, context, pos)?.get_string(doc);
            Ok(Value::Boolean(s.starts_with(&prefix)))
        }
        "contains" => {
            check_arity(name, args, 2, 2)?;
            let s = eval_arg(args, 0, env, context, pos)?.get_string(doc);
            let needle = eval_arg(args, 1, env, context, pos)?.get_string(doc);
            Ok(Value::Boolean(s.contains(&needle)))
        }
        "substring" => fn_substring(args, env, context, pos),
        "substring-before" => {
            check_arity(name, args, 2, 2)?;
            let s = eval_arg(args, 0, env, context, pos)?.get_string(doc);
            let pattern = eval_arg(args, 1, env, context, pos)?.get_string(doc);
            let result = s.find(&pattern).map(|i| s[..i].to_string()).unwrap_or_default();
            Ok(Value::String(result))
        }
        "substring-after" => {
            check_arity(name, args, 2, 2)?;
            let s = eval_arg(args, 0, env, context, pos)?.get_string(doc);
            let pattern = eval_arg(args, 1, env, context, pos)?.get_string(doc);
            let result = s.find(&pattern).map(|i| s[i + pattern.len()..].to_string()).unwrap_or_default();
            Ok(Value::String(result))
        }
        "string-length" => {
            check_arity(name, args, 0, 1)?;
            let s = if args.is_empty() { context.get_string(doc) } else { eval_arg(args, 0, env, context, pos)?.get_string(doc) };
            Ok(Value::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            check_arity(name, args, 0, 1)?;
            let s = if args.is_empty() { context.get_string(doc) } else { eval_arg(args, 0, env, context, pos)?.get_string(doc) };
            Ok(Value::String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "translate" => {
            check_arity(name, args, 3, 3)?;
            let s = eval_arg(args, 0, env, context, pos)?.get_string(doc);
            let from: Vec<char> = eval_arg(args, 1, env, context, pos)?.get_string(doc).chars().collect();
            let to: Vec<char> = eval_arg(args, 2, env, context, pos)?.get_string(doc).chars().collect();
            let result: String = s
                .chars()
                .filter_map(|c| match from.iter().position(|&fc| fc == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            Ok(Value::String(result))
        }

        "boolean" => {
            check_arity(name, args, 1, 1)?;
            Ok(Value::Boolean(eval_arg(args, 0, env, context, pos)?.get_boolean()))
        }
        "not" => {
            check_arity(name, args, 1, 1)?;
            Ok(Value::Boolean(!eval_arg(args, 0, env, context, pos)?.get_boolean()))
        }
        "true" => {
            check_arity(name, args, 0, 0)?;
            Ok(Value::Boolean(true))
        }
        "false" => {
            check_arity(name, args, 0, 0)?;
            Ok(Value::Boolean(false))
        }

        "number" => {
            check_arity(name, args, 0, 1)?;
            let n = if args.is_empty() { context.get_number(doc) } else { eval_arg(args, 0, env, context, pos)?.get_number(doc) };
            Ok(Value::Number(n))
        }
        "sum" => {
            check_arity(name, args, 1, 1)?;
            match eval_arg(args, 0, env, context, pos)? {
                Value::NodeSet(ns) => {
                    let total: f64 = ns.iter().map(|id| doc.get_number(*id)).sum();
                    Ok(Value::Number(total))
                }
                _ => Err(Error::Type("sum() requires a node-set argument".to_string())),
            }
        }
        "floor" => {
            check_arity(name, args, 1, 1)?;
            Ok(Value::Number(eval_arg(args, 0, env, context, pos)?.get_number(doc).floor()))
        }
        "ceiling" => {
            check_arity(name, args, 1, 1)?;
            Ok(Value::Number(eval_arg(args, 0, env, context, pos)?.get_number(doc).ceil()))
        }
        "round" => {
            check_arity(name, args, 1, 1)?;
            let n = eval_arg(args, 0, env, context, pos)?.get_number(doc);
            Ok(Value::Number(xpath_round(n)))
        }

        _ => Err(Error::Lookup(format!("unknown function: {name}"))),
    }
}

fn eval_arg(args: &[Expr], i: usize, env: &Env<'_>, context: &Value, pos: usize) -> Result<Value> {
    eval(&args[i], env, context, pos, true)
}

fn check_arity(name: &str, args: &[Expr], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        return Err(Error::Arity(format!(
            "{name}() expects {} argument(s), got {}",
            if min == max { format!("{min}") } else { format!("{min}-{max}") },
            args.len()
        )));
    }
    Ok(())
}

fn fn_substring(args: &[Expr], env: &Env<'_>, context: &Value, pos: usize) -> Result<Value> {
    check_arity("substring", args, 2, 3)?;
    let doc = env.doc();
    let s = eval_arg(args, 0, env, context, pos)?.get_string(doc);
    let chars: Vec<char> = s.chars().collect();

    // XPath substring() rounds each numeric argument to the nearest
    // integer (NaN propagates to an empty result, infinities clamp).
    let start = xpath_round(eval_arg(args, 1, env, context, pos)?.get_number(doc));
    let len = if args.len() == 3 {
        xpath_round(eval_arg(args, 2, env, context, pos)?.get_number(doc))
    } else {
        f64::INFINITY
    };

    if start.is_nan() || len.is_nan() {
        return Ok(Value::String(String::new()));
    }

    let end = start + len;
    let lo = start.max(1.0);
    let hi = end.min(chars.len() as f64 + 1.0);
    if hi <= lo {
        return Ok(Value::String(String::new()));
    }
    let lo = (lo - 1.0) as usize;
    let hi = (hi - 1.0) as usize;
    Ok(Value::String(chars[lo..hi].iter().collect()))
}

/// XPath rounds .5 toward positive infinity, unlike Rust's
/// round-half-away-from-zero; infinities and NaN pass through.
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        return n;
    }
    if (n.fract().abs() - 0.5).abs() < f64::EPSILON {
        n.ceil()
    } else {
        n.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::xpath::parser::parse;
    use serde_json::json;

    fn call_xpath(doc: &Document, expr: &str) -> Result<Value> {
        let ast = parse(expr).map_err(Error::Parse)?;
        let env = Env::new(doc, Value::single_node(doc.root_id()));
        eval(&ast, &env, env.get_current(), 0, true)
    }

    #[test]
    fn concat_joins_arguments() {
        let doc = Document::new(json!({}));
        let v = call_xpath(&doc, "concat('hello', ' ', 'world')").unwrap();
        assert_eq!(v.get_string(&doc), "hello world");
    }

    #[test]
    fn substring_is_one_indexed() {
        let doc = Document::new(json!({}));
        let v = call_xpath(&doc, "substring('hello', 2, 3)").unwrap();
        assert_eq!(v.get_string(&doc), "ell");
    }

    #[test]
    fn substring_handles_negative_and_fractional_start() {
        let doc = Document::new(json!({}));
        let v = call_xpath(&doc, "substring('12345', 1.5, 2.6)").unwrap();
        assert_eq!(v.get_string(&doc), "234");
    }

    #[test]
    fn round_rounds_half_up() {
        let doc = Document::new(json!({}));
        let v = call_xpath(&doc, "round(-0.5)").unwrap();
        assert_eq!(v.get_number(&doc), 0.0);
    }

    #[test]
    fn id_is_rejected() {
        let doc = Document::new(json!({}));
        assert!(call_xpath(&doc, "id('x')").is_err());
    }

    #[test]
    fn count_requires_a_node_set() {
        let doc = Document::new(json!({}));
        assert!(call_xpath(&doc, "count(1)").is_err());
    }
}
