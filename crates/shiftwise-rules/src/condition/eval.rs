//! Evaluation of parsed conditions against a fact context.

use shiftwise_core::{FactValue, Result, ScheduleError};

use super::compare::{compare_values, values_equal};
use super::expr::{CompareOp, Expr};
use crate::facts::FactContext;

/// Outcome of evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub value: bool,
    /// Facts actually read, in first-read order. Facts behind a
    /// short-circuited branch are not listed.
    pub consulted: Vec<String>,
}

/// Evaluates `expr` as a boolean condition.
///
/// Pure: the context is only read. `and`/`or` short-circuit.
///
/// # Errors
///
/// [`ScheduleError::UnknownFact`] for a fact missing from the context,
/// [`ScheduleError::TypeMismatch`] for incompatible operands or a
/// non-boolean result.
pub fn evaluate(expr: &Expr, ctx: &FactContext) -> Result<Evaluation> {
    let mut consulted = Vec::new();
    let value = eval_bool(expr, ctx, &mut consulted)?;
    Ok(Evaluation { value, consulted })
}

fn eval_bool(expr: &Expr, ctx: &FactContext, consulted: &mut Vec<String>) -> Result<bool> {
    match expr {
        Expr::And(left, right) => {
            if !eval_bool(left, ctx, consulted)? {
                return Ok(false);
            }
            eval_bool(right, ctx, consulted)
        }
        Expr::Or(left, right) => {
            if eval_bool(left, ctx, consulted)? {
                return Ok(true);
            }
            eval_bool(right, ctx, consulted)
        }
        Expr::Not(inner) => Ok(!eval_bool(inner, ctx, consulted)?),
        other => {
            let value = eval_value(other, ctx, consulted)?;
            value.as_bool().ok_or_else(|| {
                ScheduleError::TypeMismatch(format!(
                    "'{}' is {} {}, expected bool",
                    other,
                    value.type_name(),
                    value
                ))
            })
        }
    }
}

fn eval_value(expr: &Expr, ctx: &FactContext, consulted: &mut Vec<String>) -> Result<FactValue> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Fact(name) => {
            let value = ctx
                .get(name)
                .ok_or_else(|| ScheduleError::UnknownFact(name.clone()))?;
            if !consulted.iter().any(|c| c == name) {
                consulted.push(name.clone());
            }
            Ok(value.clone())
        }
        Expr::List(items) => items
            .iter()
            .map(|item| eval_value(item, ctx, consulted))
            .collect::<Result<Vec<_>>>()
            .map(FactValue::List),
        Expr::Compare { op, left, right } => {
            let a = eval_value(left, ctx, consulted)?;
            let b = eval_value(right, ctx, consulted)?;
            let result = match op {
                CompareOp::Eq => values_equal(&a, &b)?,
                CompareOp::Ne => !values_equal(&a, &b)?,
                CompareOp::Lt => compare_values(op.symbol(), &a, &b)?.is_lt(),
                CompareOp::Le => compare_values(op.symbol(), &a, &b)?.is_le(),
                CompareOp::Gt => compare_values(op.symbol(), &a, &b)?.is_gt(),
                CompareOp::Ge => compare_values(op.symbol(), &a, &b)?.is_ge(),
            };
            Ok(FactValue::Bool(result))
        }
        Expr::In(value, list) => {
            let needle = eval_value(value, ctx, consulted)?;
            let haystack = eval_value(list, ctx, consulted)?;
            let items = haystack.as_list().ok_or_else(|| {
                ScheduleError::TypeMismatch(format!(
                    "'in' needs a list, got {}",
                    haystack.type_name()
                ))
            })?;
            for item in items {
                if values_equal(&needle, item)? {
                    return Ok(FactValue::Bool(true));
                }
            }
            Ok(FactValue::Bool(false))
        }
        Expr::And(..) | Expr::Or(..) | Expr::Not(..) => {
            eval_bool(expr, ctx, consulted).map(FactValue::Bool)
        }
    }
}
