//! Printed representation of values
//!
//! `write` form quotes and escapes strings so that reading the output back
//! yields an equal tree; `display` form prints string contents raw.
//! A reference back to a list that is still being printed comes out as
//! `...`, so cyclic structures print in finite space.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::runtime::interner::Interner;
use crate::runtime::value::{Pair, Special, Value};

/// Print in `write` form
pub fn print(value: &Value, interner: &Interner) -> String {
    render(value, interner, false, None)
}

/// Print in `display` form
pub fn display(value: &Value, interner: &Interner) -> String {
    render(value, interner, true, None)
}

/// Print in `write` form, cut to `width` characters followed by `...`
pub fn print_limited(value: &Value, interner: &Interner, width: usize) -> String {
    render(value, interner, false, Some(width))
}

fn render(value: &Value, interner: &Interner, display: bool, limit: Option<usize>) -> String {
    let mut writer = Writer {
        interner,
        display,
        limit,
        out: String::new(),
        len: 0,
        full: false,
        open: HashSet::new(),
    };
    writer.value(value);
    writer.out
}

struct Writer<'a> {
    interner: &'a Interner,
    display: bool,
    limit: Option<usize>,
    out: String,
    /// Characters written so far
    len: usize,
    full: bool,
    /// Cells of the lists currently being printed
    open: HashSet<*const RefCell<Pair>>,
}

impl Writer<'_> {
    /// Appends `s`; returns false once the width limit has been hit
    fn push(&mut self, s: &str) -> bool {
        if self.full {
            return false;
        }
        let Some(limit) = self.limit else {
            self.out.push_str(s);
            return true;
        };
        for c in s.chars() {
            if self.len == limit {
                self.out.push_str("...");
                self.full = true;
                return false;
            }
            self.out.push(c);
            self.len += 1;
        }
        true
    }

    fn value(&mut self, value: &Value) -> bool {
        match value {
            Value::Nil => self.push("()"),
            Value::Special(Special::True) => self.push("#t"),
            Value::Special(Special::False) => self.push("#f"),
            Value::Special(Special::Undef) => self.push("#undef"),
            Value::Number(n) => self.push(&n.to_string()),
            Value::Atom(a) => {
                let name = self.interner.name(*a);
                self.push(name)
            }
            Value::String(s) if self.display => self.push(s),
            Value::String(s) => self.push(&escape(s)),
            Value::Procedure(p) => {
                let name = p.name();
                let label = if p.is_macro() { "macro" } else { "proc" };
                if name.is_empty() {
                    self.push(&format!("#<{}>", label))
                } else {
                    self.push(&format!("#<{} {}>", label, name))
                }
            }
            Value::Custom(c) => self.push(&format!("#<custom {}>", c.describe())),
            Value::Cell(c) if self.open.contains(&Rc::as_ptr(c)) => self.push("..."),
            Value::Cell(_) => self.list(value),
        }
    }

    fn list(&mut self, value: &Value) -> bool {
        let mut spine = Vec::new();
        let ok = self.list_items(value, &mut spine);
        for cell in spine {
            self.open.remove(&cell);
        }
        ok
    }

    fn list_items(&mut self, value: &Value, spine: &mut Vec<*const RefCell<Pair>>) -> bool {
        if !self.push("(") {
            return false;
        }
        let mut cur = value.clone();
        let mut first = true;
        while let Value::Cell(cell) = &cur {
            if !first && !self.push(" ") {
                return false;
            }
            first = false;
            if !self.open.insert(Rc::as_ptr(cell)) {
                return self.push("...)");
            }
            spine.push(Rc::as_ptr(cell));
            let (car, cdr) = {
                let pair = cell.borrow();
                (pair.car.clone(), pair.cdr.clone())
            };
            if !self.value(&car) {
                return false;
            }
            cur = cdr;
        }
        if !cur.is_nil() && (!self.push(" . ") || !self.value(&cur)) {
            return false;
        }
        self.push(")")
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
