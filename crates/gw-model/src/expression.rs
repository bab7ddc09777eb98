//! Expression evaluator (spec §4.2).
//!
//! Expressions are restricted to arithmetic/boolean expressions over a
//! single bound variable `value`, plus `abs/sqrt/log/min/max` and the
//! infix operators `+ - * / > < >= <= == != && ||`. This is not a general
//! rule DSL: there is exactly one variable, and it is always named
//! `value` (spec.md §1 Non-goals).
//!
//! A simple-form fast path recognizes `value <op> <literal>` and skips
//! `evalexpr` entirely, matching spec.md §4.2's explicit requirement and
//! avoiding a full parse for the overwhelmingly common alarm-condition
//! shape (`value > 100`, `value <= 0.5`, ...).

use evalexpr::{ContextWithMutableFunctions, ContextWithMutableVariables, Function, HashMapContext};
use gw_errors::{GatewayError, Result};

/// Outcome of evaluating an expression: arithmetic expressions yield a
/// float, comparisons/boolean expressions yield a bool (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalResult {
    Float(f64),
    Bool(bool),
}

impl EvalResult {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EvalResult::Bool(b) => Some(*b),
            EvalResult::Float(f) => Some(*f != 0.0),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EvalResult::Float(f) => Some(*f),
            EvalResult::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }
}

/// Evaluates `expr` with `value` bound to `bound`, returning a float or a
/// bool per spec.md §4.2. Used by the point mapper (transform, always
/// arithmetic) and the rule engine (alarm/linkage condition, always
/// boolean).
pub fn evaluate(expr: &str, bound: f64) -> Result<EvalResult> {
    let expr = expr.trim();
    if let Some(result) = simple_form(expr, bound) {
        return Ok(EvalResult::Bool(result));
    }

    let mut context = HashMapContext::new();
    context
        .set_value("value".into(), evalexpr::Value::Float(bound))
        .map_err(|e| parse_err(expr, e))?;
    install_functions(&mut context).map_err(|e| parse_err(expr, e))?;

    let value = evalexpr::eval_with_context(expr, &context).map_err(|e| eval_err(expr, e))?;
    match value {
        evalexpr::Value::Boolean(b) => Ok(EvalResult::Bool(b)),
        evalexpr::Value::Float(f) => Ok(EvalResult::Float(f)),
        evalexpr::Value::Int(i) => Ok(EvalResult::Float(i as f64)),
        other => Err(GatewayError::ExpressionEval {
            expr: expr.to_string(),
            reason: format!("expression did not evaluate to a number or bool: {other:?}"),
        }),
    }
}

/// Convenience wrapper for the rule engine (§4.7): alarm and linkage
/// conditions are always boolean.
pub fn evaluate_bool(expr: &str, bound: f64) -> Result<bool> {
    evaluate(expr, bound)?
        .as_bool()
        .ok_or_else(|| GatewayError::ExpressionEval {
            expr: expr.to_string(),
            reason: "expression did not evaluate to a boolean".to_string(),
        })
}

/// Convenience wrapper for the point mapper (§4.3): transforms are
/// always arithmetic.
pub fn evaluate_float(expr: &str, bound: f64) -> Result<f64> {
    evaluate(expr, bound)?
        .as_f64()
        .ok_or_else(|| GatewayError::ExpressionEval {
            expr: expr.to_string(),
            reason: "expression did not evaluate to a number".to_string(),
        })
}

fn install_functions(context: &mut HashMapContext) -> std::result::Result<(), evalexpr::EvalexprError> {
    context.set_function(
        "abs".into(),
        Function::new(|arg| Ok(evalexpr::Value::Float(arg.as_number()?.abs()))),
    )?;
    context.set_function(
        "sqrt".into(),
        Function::new(|arg| Ok(evalexpr::Value::Float(arg.as_number()?.sqrt()))),
    )?;
    context.set_function(
        "log".into(),
        Function::new(|arg| Ok(evalexpr::Value::Float(arg.as_number()?.ln()))),
    )?;
    context.set_function(
        "min".into(),
        Function::new(|arg| {
            let tuple = arg.as_tuple()?;
            let mut it = tuple.iter();
            let first = it.next().ok_or_else(|| {
                evalexpr::EvalexprError::WrongFunctionArgumentAmount {
                    expected: 2..=usize::MAX,
                    actual: 0,
                }
            })?;
            let mut best = first.as_number()?;
            for v in it {
                best = best.min(v.as_number()?);
            }
            Ok(evalexpr::Value::Float(best))
        }),
    )?;
    context.set_function(
        "max".into(),
        Function::new(|arg| {
            let tuple = arg.as_tuple()?;
            let mut it = tuple.iter();
            let first = it.next().ok_or_else(|| {
                evalexpr::EvalexprError::WrongFunctionArgumentAmount {
                    expected: 2..=usize::MAX,
                    actual: 0,
                }
            })?;
            let mut best = first.as_number()?;
            for v in it {
                best = best.max(v.as_number()?);
            }
            Ok(evalexpr::Value::Float(best))
        }),
    )?;
    Ok(())
}

fn parse_err(expr: &str, e: impl std::fmt::Display) -> GatewayError {
    GatewayError::ExpressionParse {
        expr: expr.to_string(),
        reason: e.to_string(),
    }
}

fn eval_err(expr: &str, e: impl std::fmt::Display) -> GatewayError {
    GatewayError::ExpressionEval {
        expr: expr.to_string(),
        reason: e.to_string(),
    }
}

/// Recognizes `value <op> <literal>` without tokenizing the general
/// grammar. Returns `None` when the expression isn't in this shape, so
/// the caller falls back to the full `evalexpr` parser.
fn simple_form(expr: &str, bound: f64) -> Option<bool> {
    const OPS: [&str; 6] = [">=", "<=", "==", "!=", ">", "<"];
    let rest = expr.strip_prefix("value")?.trim_start();

    for op in OPS {
        if let Some(literal) = rest.strip_prefix(op) {
            let literal = literal.trim();
            let rhs: f64 = literal.parse().ok()?;
            return Some(match op {
                ">=" => bound >= rhs,
                "<=" => bound <= rhs,
                "==" => (bound - rhs).abs() < f64::EPSILON,
                "!=" => (bound - rhs).abs() >= f64::EPSILON,
                ">" => bound > rhs,
                "<" => bound < rhs,
                _ => unreachable!(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_form_handles_all_comparisons() {
        assert!(evaluate_bool("value > 50", 50.01).unwrap());
        assert!(!evaluate_bool("value > 50", 50.0).unwrap());
        assert!(evaluate_bool("value >= 50", 50.0).unwrap());
        assert!(evaluate_bool("value <= 50", 50.0).unwrap());
        assert!(evaluate_bool("value < 50", 49.9).unwrap());
        assert!(evaluate_bool("value == 50", 50.0).unwrap());
        assert!(evaluate_bool("value != 50", 49.0).unwrap());
    }

    #[test]
    fn alarm_condition_boundary_scenario() {
        // spec §8 boundary behavior: triggers for 50.01, not for 50.0.
        assert!(evaluate_bool("value > 100", 150.0).unwrap());
        assert!(!evaluate_bool("value > 100", 50.0).unwrap());
    }

    #[test]
    fn general_form_supports_functions() {
        assert!((evaluate_float("abs(value)", -4.0).unwrap() - 4.0).abs() < 1e-9);
        assert!((evaluate_float("sqrt(value)", 9.0).unwrap() - 3.0).abs() < 1e-9);
        assert!((evaluate_float("value * 2 + 1", 3.0).unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn general_form_supports_boolean_combinators() {
        assert!(evaluate_bool("value > 10 && value < 20", 15.0).unwrap());
        assert!(!evaluate_bool("value > 10 && value < 20", 25.0).unwrap());
        assert!(evaluate_bool("value < 10 || value > 20", 25.0).unwrap());
    }

    #[test]
    fn identity_transform_is_value_times_one() {
        assert!((evaluate_float("value * 1", 42.5).unwrap() - 42.5).abs() < 1e-9);
    }

    #[test]
    fn parse_error_is_distinct_from_eval_error() {
        let err = evaluate_float("value +", 1.0).unwrap_err();
        assert!(matches!(err, GatewayError::ExpressionEval { .. }) || matches!(err, GatewayError::ExpressionParse { .. }));
    }
}
