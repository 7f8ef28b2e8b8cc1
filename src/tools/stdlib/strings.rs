//! String natives
//!
//! Indices and lengths count Unicode scalar values. There is no character
//! type: `string->list` yields code points as numbers and `list->string`
//! takes them back.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::runtime::{Atom, LispEvaluator, Value};
use crate::tools::Registry;

/// Register all string natives
pub fn register(registry: &mut Registry<'_>) {
    registry.function("string-length", string_length);
    registry.function("substring", substring);
    registry.variadic("string-append", string_append);
    registry.function("string->list", string_to_list);
    registry.function("list->string", list_to_string);
    registry.function("string->number", string_to_number);
    registry.function("number->string", number_to_string);
    registry.function("string->symbol", string_to_symbol);
    registry.function("symbol->string", symbol_to_string);
}

fn string_length(_ctx: &mut LispEvaluator<'_>, s: Rc<str>) -> Result<i64> {
    Ok(s.chars().count() as i64)
}

/// SUBSTRING - Characters in `[start, end)`
fn substring(_ctx: &mut LispEvaluator<'_>, s: Rc<str>, start: i64, end: i64) -> Result<String> {
    let len = s.chars().count() as i64;
    if start < 0 || end < start || end > len {
        return Err(Error::type_mismatch(
            format!("range within 0..={}", len),
            format!("{}..{}", start, end),
        ));
    }
    Ok(s.chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect())
}

fn string_append(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<String> {
    let mut out = String::new();
    for v in args.iter() {
        out.push_str(v.as_str()?);
    }
    Ok(out)
}

fn string_to_list(_ctx: &mut LispEvaluator<'_>, s: Rc<str>) -> Result<Value> {
    Ok(Value::list(s.chars().map(|c| Value::Number(c as i64))))
}

fn list_to_string(_ctx: &mut LispEvaluator<'_>, list: Value) -> Result<String> {
    list.to_vec()?
        .iter()
        .map(|v| {
            let code = v.as_number()?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| Error::type_mismatch("character code", code.to_string()))
        })
        .collect()
}

/// STRING->NUMBER - `#f` when the text is not a decimal integer
fn string_to_number(_ctx: &mut LispEvaluator<'_>, s: Rc<str>) -> Result<Value> {
    Ok(match s.trim().parse::<i64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::FALSE,
    })
}

fn number_to_string(_ctx: &mut LispEvaluator<'_>, n: i64) -> Result<String> {
    Ok(n.to_string())
}

fn string_to_symbol(ctx: &mut LispEvaluator<'_>, s: Rc<str>) -> Result<Atom> {
    Ok(ctx.intern(&s))
}

fn symbol_to_string(ctx: &mut LispEvaluator<'_>, atom: Atom) -> Result<String> {
    Ok(ctx.atom_name(atom).to_string())
}
