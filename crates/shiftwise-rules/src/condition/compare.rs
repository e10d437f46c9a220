//! Value comparison for condition operands.

use std::cmp::Ordering;

use shiftwise_core::{FactValue, Result, ScheduleError};

fn mismatch(op: &str, a: &FactValue, b: &FactValue) -> ScheduleError {
    ScheduleError::TypeMismatch(format!(
        "cannot apply '{}' to {} {} and {} {}",
        op,
        a.type_name(),
        a,
        b.type_name(),
        b
    ))
}

/// Equality; integers and floats compare numerically, other types must match.
///
/// Mixed int/float operands are converted to `f64` and compared exactly, so
/// `40 = 40.0` holds and `0 = 0.0000001` does not.
pub fn values_equal(a: &FactValue, b: &FactValue) -> Result<bool> {
    match (a, b) {
        (FactValue::Int(x), FactValue::Int(y)) => Ok(x == y),
        (x, y) if x.is_numeric() && y.is_numeric() => Ok(x.as_f64() == y.as_f64()),
        (FactValue::Str(x), FactValue::Str(y)) => Ok(x == y),
        (FactValue::Bool(x), FactValue::Bool(y)) => Ok(x == y),
        (FactValue::List(_), FactValue::List(_)) => Ok(a == b),
        _ => Err(mismatch("=", a, b)),
    }
}

/// Ordering for `<`, `<=`, `>`, `>=`: numbers across int/float, strings lexicographically.
pub fn compare_values(op: &str, a: &FactValue, b: &FactValue) -> Result<Ordering> {
    match (a, b) {
        (FactValue::Int(x), FactValue::Int(y)) => Ok(x.cmp(y)),
        (x, y) if x.is_numeric() && y.is_numeric() => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).ok_or_else(|| mismatch(op, a, b))
        }
        (FactValue::Str(x), FactValue::Str(y)) => Ok(x.cmp(y)),
        _ => Err(mismatch(op, a, b)),
    }
}
