//! Type predicate natives

use crate::error::Result;
use crate::runtime::{LispEvaluator, Special, Value};
use crate::tools::Registry;

/// Register all type predicates
pub fn register(registry: &mut Registry<'_>) {
    registry.function("null?", null_p);
    registry.function("number?", number_p);
    registry.function("pair?", pair_p);
    registry.function("string?", string_p);
    registry.function("boolean?", boolean_p);
    registry.function("procedure?", procedure_p);
    registry.function("symbol?", symbol_p);
}

/// NULL? - true only for the empty list
fn null_p(_ctx: &mut LispEvaluator<'_>, v: Value) -> Result<bool> {
    Ok(v.is_nil())
}

fn number_p(_ctx: &mut LispEvaluator<'_>, v: Value) -> Result<bool> {
    Ok(matches!(v, Value::Number(_)))
}

fn pair_p(_ctx: &mut LispEvaluator<'_>, v: Value) -> Result<bool> {
    Ok(v.is_cell())
}

fn string_p(_ctx: &mut LispEvaluator<'_>, v: Value) -> Result<bool> {
    Ok(matches!(v, Value::String(_)))
}

/// BOOLEAN? - `#t` or `#f`; `#undef` is not a boolean
fn boolean_p(_ctx: &mut LispEvaluator<'_>, v: Value) -> Result<bool> {
    Ok(matches!(
        v,
        Value::Special(Special::True) | Value::Special(Special::False)
    ))
}

/// PROCEDURE? - natives, lambdas and macros alike
fn procedure_p(_ctx: &mut LispEvaluator<'_>, v: Value) -> Result<bool> {
    Ok(matches!(v, Value::Procedure(_)))
}

fn symbol_p(_ctx: &mut LispEvaluator<'_>, v: Value) -> Result<bool> {
    Ok(matches!(v, Value::Atom(_)))
}
