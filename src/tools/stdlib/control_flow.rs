//! Control natives: `not`, `break`, `undef`

use crate::error::Result;
use crate::runtime::{Flow, LispEvaluator, Signal, Value};
use crate::tools::Registry;

/// Register all control natives
pub fn register(registry: &mut Registry<'_>) {
    registry.function("not", not);
    registry.variadic("break", break_loop);
    registry.function("undef", undef);
}

fn not(_ctx: &mut LispEvaluator<'_>, v: bool) -> Result<bool> {
    Ok(!v)
}

/// BREAK - Leaves the innermost `loop` with the given value (`#undef` if none)
fn break_loop(_ctx: &mut LispEvaluator<'_>, args: Value) -> Flow<Value> {
    let value = args.iter().next().unwrap_or(Value::UNDEF);
    Err(Signal::Break(value))
}

fn undef(_ctx: &mut LispEvaluator<'_>) -> Result<Value> {
    Ok(Value::UNDEF)
}
