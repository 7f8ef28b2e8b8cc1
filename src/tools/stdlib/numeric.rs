//! Numeric natives: arithmetic, comparison and equality
//!
//! Integer arithmetic wraps on overflow. Comparisons chain over their
//! arguments and accept either all numbers or all strings.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::runtime::{LispEvaluator, Value};
use crate::tools::Registry;

/// Register all numeric natives
pub fn register(registry: &mut Registry<'_>) {
    // Arithmetic
    registry.variadic("+", add);
    registry.variadic("-", sub);
    registry.variadic("*", multiply);
    registry.variadic("/", divide);
    registry.function("modulo", modulo);
    registry.function("abs", abs);
    registry.function("negative?", negative_p);
    registry.function("positive?", positive_p);
    registry.function("zero?", zero_p);
    registry.variadic("min", min);
    registry.variadic("max", max);

    // Comparison
    registry.variadic(">", greater);
    registry.variadic(">=", greater_eq);
    registry.variadic("<", less);
    registry.variadic("<=", less_eq);
    registry.variadic("=", num_eq);

    // Equality
    registry.variadic("eq?", eq_p);
    registry.variadic("eqv?", eq_p);
    registry.variadic("equal?", equal_p);
}

// ============================================================================
// Arithmetic
// ============================================================================

/// + - Sums numbers, or concatenates strings when the first argument is a string
fn add(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
    match args.car() {
        Ok(Value::String(_)) => {
            let mut out = String::new();
            for v in args.iter() {
                out.push_str(v.as_str()?);
            }
            Ok(Value::from(out))
        }
        Ok(_) => Ok(Value::Number(
            numbers(&args)?
                .into_iter()
                .fold(0i64, i64::wrapping_add),
        )),
        Err(_) => Ok(Value::Number(0)),
    }
}

/// - - Negates a single argument, otherwise subtracts the rest from the first
fn sub(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<i64> {
    let nums = numbers(&args)?;
    match nums.split_first() {
        None => Err(Error::ArityMismatch {
            expected: 1,
            got: 0,
        }),
        Some((first, [])) => Ok(first.wrapping_neg()),
        Some((first, rest)) => Ok(rest.iter().fold(*first, |acc, n| acc.wrapping_sub(*n))),
    }
}

fn multiply(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<i64> {
    Ok(numbers(&args)?.into_iter().fold(1i64, i64::wrapping_mul))
}

/// / - Integer division truncating toward zero, left to right
fn divide(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<i64> {
    let nums = numbers(&args)?;
    let (first, rest) = nums.split_first().ok_or(Error::ArityMismatch {
        expected: 1,
        got: 0,
    })?;
    if rest.is_empty() {
        return checked_div(1, *first);
    }
    rest.iter().try_fold(*first, |acc, n| checked_div(acc, *n))
}

fn checked_div(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    Ok(a.wrapping_div(b))
}

/// MODULO - Result takes the sign of the divisor
fn modulo(_ctx: &mut LispEvaluator<'_>, a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn abs(_ctx: &mut LispEvaluator<'_>, a: i64) -> Result<i64> {
    Ok(a.wrapping_abs())
}

fn negative_p(_ctx: &mut LispEvaluator<'_>, a: i64) -> Result<bool> {
    Ok(a < 0)
}

fn positive_p(_ctx: &mut LispEvaluator<'_>, a: i64) -> Result<bool> {
    Ok(a > 0)
}

fn zero_p(_ctx: &mut LispEvaluator<'_>, a: i64) -> Result<bool> {
    Ok(a == 0)
}

fn min(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<i64> {
    numbers(&args)?
        .into_iter()
        .min()
        .ok_or(Error::ArityMismatch {
            expected: 1,
            got: 0,
        })
}

fn max(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<i64> {
    numbers(&args)?
        .into_iter()
        .max()
        .ok_or(Error::ArityMismatch {
            expected: 1,
            got: 0,
        })
}

/// Every argument as a number
fn numbers(args: &Value) -> Result<Vec<i64>> {
    args.to_vec()?.iter().map(Value::as_number).collect()
}

// ============================================================================
// Comparison
// ============================================================================

fn greater(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<bool> {
    chain(&args, |o| o == Ordering::Greater)
}

fn greater_eq(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<bool> {
    chain(&args, |o| o != Ordering::Less)
}

fn less(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<bool> {
    chain(&args, |o| o == Ordering::Less)
}

fn less_eq(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<bool> {
    chain(&args, |o| o != Ordering::Greater)
}

fn num_eq(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<bool> {
    chain(&args, |o| o == Ordering::Equal)
}

/// Applies `holds` to every adjacent pair; the whole chain is type checked first
fn chain(args: &Value, holds: impl Fn(Ordering) -> bool) -> Result<bool> {
    let items = args.to_vec()?;
    let mut result = true;
    for pair in items.windows(2) {
        let ordering = compare(&pair[0], &pair[1])?;
        result &= holds(ordering);
    }
    Ok(result)
}

fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Number(_), other) => Err(Error::type_mismatch("number", other.type_name())),
        (Value::String(_), other) => Err(Error::type_mismatch("string", other.type_name())),
        (other, _) => Err(Error::type_mismatch("number or string", other.type_name())),
    }
}

// ============================================================================
// Equality
// ============================================================================

/// EQ? / EQV? - Identity for cells and procedures, value for atoms, numbers and strings
fn eq_p(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<bool> {
    let items = args.to_vec()?;
    Ok(items.windows(2).all(|pair| pair[0] == pair[1]))
}

/// EQUAL? - Structural equality
fn equal_p(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<bool> {
    let items = args.to_vec()?;
    Ok(items.windows(2).all(|pair| pair[0].equal(&pair[1])))
}
