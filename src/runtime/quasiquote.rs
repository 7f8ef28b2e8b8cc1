//! Quasiquote rewriting
//!
//! `` `x `` is not evaluated directly. At expansion time the template is
//! rewritten into ordinary `cons`/`list`/`append`/`quote` calls, tracking the
//! nesting depth so that an inner quasiquote keeps its own unquotes literal.

use crate::error::{Error, Result};
use crate::runtime::interner::{sym, Atom};
use crate::runtime::Value;

/// Rewrites template `x` found at quasiquote nesting `depth` (0 = outermost)
pub fn expand(x: &Value, depth: usize) -> Result<Value> {
    match x {
        Value::Cell(_) => expand_cell(x, depth),
        Value::Atom(_) | Value::Nil => Ok(quote(x.clone())),
        other => Ok(other.clone()),
    }
}

fn expand_cell(x: &Value, depth: usize) -> Result<Value> {
    let head = x.car()?;
    let tail = x.cdr()?;

    if let Value::Atom(atom) = head {
        match atom {
            sym::UNQUOTE | sym::UNQUOTE_SPLICING if depth == 0 => return operand(x, atom),
            sym::UNQUOTE | sym::UNQUOTE_SPLICING => {
                let inner = expand(&operand(x, atom)?, depth - 1)?;
                return Ok(rewrap(atom, inner));
            }
            sym::QUASIQUOTE => {
                let inner = expand(&operand(x, atom)?, depth + 1)?;
                return Ok(rewrap(atom, inner));
            }
            _ => {}
        }
    }

    // ,@e in element position splices e into the rest of the list
    if depth == 0 && head.is_cell() && head.car()?.is_atom(sym::UNQUOTE_SPLICING) {
        let spliced = operand(&head, sym::UNQUOTE_SPLICING)?;
        if tail.is_nil() {
            return Ok(spliced);
        }
        return Ok(call(sym::APPEND, vec![spliced, expand(&tail, depth)?]));
    }

    Ok(call(
        sym::CONS,
        vec![expand(&head, depth)?, expand(&tail, depth)?],
    ))
}

/// The single operand of `(unquote e)` and friends
fn operand(form: &Value, name: Atom) -> Result<Value> {
    let rest = form.cdr()?;
    match (rest.car(), rest.cdr()) {
        (Ok(e), Ok(Value::Nil)) => Ok(e),
        _ => Err(Error::MacroExpansionError(format!(
            "{} expects exactly one operand",
            match name {
                sym::UNQUOTE => "unquote",
                sym::UNQUOTE_SPLICING => "unquote-splicing",
                _ => "quasiquote",
            }
        ))),
    }
}

/// `(list 'name inner)`, rebuilding a nested quasiquote form at run time
fn rewrap(name: Atom, inner: Value) -> Value {
    call(sym::LIST, vec![quote(Value::Atom(name)), inner])
}

fn quote(x: Value) -> Value {
    Value::list(vec![Value::Atom(sym::QUOTE), x])
}

fn call(head: Atom, args: Vec<Value>) -> Value {
    Value::cons(Value::Atom(head), Value::list(args))
}
