//! Natives giving programs access to the macro pass

use crate::error::{Error, Result};
use crate::runtime::interner::sym;
use crate::runtime::{quasiquote, Atom, Compiler, LispEvaluator, ProcRef, Value};
use crate::tools::Registry;

/// Register all compiler-access natives
pub fn register(registry: &mut Registry<'_>) {
    registry.variadic_macro("defmacro", defmacro);
    registry.macro_fn("quasiquote", quasiquote_macro);
    registry.function("procedure-set-name!", procedure_set_name);
    registry.function("procedure-set-macro!", procedure_set_macro);
    registry.function("macroexpand", macroexpand);
    registry.function("macroexpand-1", macroexpand_1);
}

/// DEFMACRO - `(defmacro name params body ...)`
///
/// Expands to a global `define` of a lambda tagged as a named macro. The
/// macro becomes visible to forms compiled after this one is evaluated.
fn defmacro(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
    let name = args
        .car()
        .and_then(|v| v.as_atom())
        .map_err(|_| Error::MacroExpansionError("defmacro: name must be an atom".to_string()))?;
    let rest = args.cdr()?;
    let params = rest
        .car()
        .map_err(|_| Error::MacroExpansionError("defmacro: missing parameter list".to_string()))?;
    let body = rest.cdr()?;

    let lambda = Value::cons(Value::Atom(sym::LAMBDA), Value::cons(params, body));
    let named = Value::list(vec![
        Value::Atom(sym::PROCEDURE_SET_NAME),
        Value::list(vec![Value::Atom(sym::QUOTE), Value::Atom(name)]),
        lambda,
    ]);
    let tagged = Value::list(vec![Value::Atom(sym::PROCEDURE_SET_MACRO), named]);
    Ok(Value::list(vec![Value::Atom(sym::DEFINE), Value::Atom(name), tagged]))
}

fn quasiquote_macro(_ctx: &mut LispEvaluator<'_>, template: Value) -> Result<Value> {
    quasiquote::expand(&template, 0)
}

fn procedure_set_name(ctx: &mut LispEvaluator<'_>, name: Atom, proc: ProcRef) -> Result<ProcRef> {
    proc.set_name(ctx.atom_name(name));
    Ok(proc)
}

fn procedure_set_macro(_ctx: &mut LispEvaluator<'_>, proc: ProcRef) -> Result<ProcRef> {
    proc.set_macro(true);
    Ok(proc)
}

/// MACROEXPAND - Full expansion, as the compiler would run it
fn macroexpand(ctx: &mut LispEvaluator<'_>, code: Value) -> Result<Value> {
    ctx.compile(&code)
}

/// MACROEXPAND-1 - A single expansion step at the head of the form
fn macroexpand_1(ctx: &mut LispEvaluator<'_>, code: Value) -> Result<Value> {
    Compiler::new(ctx).expand_once(&code)
}
