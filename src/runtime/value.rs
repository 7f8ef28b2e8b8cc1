use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::runtime::interner::Atom;
use crate::runtime::lisp_evaluator::LispEvaluator;
use crate::runtime::signal::Flow;

/// Shared, mutable pair cell
///
/// Cells are reference counted. Both fields can be overwritten through
/// `set-car!`/`set-cdr!`, so cyclic graphs are constructible; a cycle keeps
/// its cells alive until the process exits. List walks, the printer and
/// [`Value::equal`] stop at a cycle instead of looping.
pub type CellRef = Rc<RefCell<Pair>>;

/// Shared procedure handle
pub type ProcRef = Rc<Procedure>;

/// Uniform native calling convention: evaluator context plus the evaluated argument list
pub type NativeFn = dyn Fn(&mut LispEvaluator<'_>, Value) -> Flow<Value>;

/// Runtime value representation
#[derive(Clone)]
pub enum Value {
    /// Empty list
    Nil,
    /// Named singleton marker (`#t`, `#f`, `#undef`)
    Special(Special),
    /// Signed integer
    Number(i64),
    /// Interned symbol
    Atom(Atom),
    /// Mutable pair
    Cell(CellRef),
    /// Immutable text
    String(Rc<str>),
    /// Native or interpreted procedure
    Procedure(ProcRef),
    /// Host-defined opaque value
    Custom(Rc<dyn CustomObject>),
}

/// Singleton markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    True,
    False,
    Undef,
}

/// A mutable ordered pair
#[derive(Clone, Debug)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

/// Unlinks uniquely owned cells one at a time, so releasing a long list
/// does not recurse once per cell
impl Drop for Pair {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_unique(&mut self.car, &mut pending);
        take_unique(&mut self.cdr, &mut pending);
        while let Some(cell) = pending.pop() {
            let mut pair = cell.into_inner();
            take_unique(&mut pair.car, &mut pending);
            take_unique(&mut pair.cdr, &mut pending);
        }
    }
}

/// Moves the cell in `slot` onto `pending` when `slot` holds its last handle
fn take_unique(slot: &mut Value, pending: &mut Vec<RefCell<Pair>>) {
    if !matches!(slot, Value::Cell(_)) {
        return;
    }
    if let Value::Cell(cell) = std::mem::replace(slot, Value::Nil) {
        if let Ok(inner) = Rc::try_unwrap(cell) {
            pending.push(inner);
        }
    }
}

/// Extension point for host values carried through the interpreter untouched
pub trait CustomObject {
    /// Short type label used in error messages and printed forms
    fn type_name(&self) -> &str;

    /// Printed representation inside `#<custom ...>`
    fn describe(&self) -> String {
        self.type_name().to_string()
    }

    /// Downcasting support for natives that know the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// A callable value
///
/// The name and macro flag are mutable after construction so that
/// `procedure-set-name!` and `procedure-set-macro!` can tag a freshly built lambda.
pub struct Procedure {
    name: RefCell<String>,
    is_macro: std::cell::Cell<bool>,
    /// Native or interpreted body
    pub kind: ProcedureKind,
}

/// The two procedure representations
pub enum ProcedureKind {
    /// Host function; `arity == -1` receives the whole argument list
    Native {
        /// Positional parameter count, or -1 for variadic
        arity: i32,
        /// Marshalled host function
        func: Rc<NativeFn>,
    },
    /// Lambda built by the evaluator
    Interpreted {
        /// Atom, proper list of atoms, or dotted list of atoms
        params: Value,
        /// Body forms, evaluated as a `begin` sequence
        body: Value,
    },
}

impl Procedure {
    /// Wrap a native function
    pub fn native(name: impl Into<String>, arity: i32, func: Rc<NativeFn>) -> ProcRef {
        Rc::new(Procedure {
            name: RefCell::new(name.into()),
            is_macro: std::cell::Cell::new(false),
            kind: ProcedureKind::Native { arity, func },
        })
    }

    /// Build an anonymous interpreted procedure
    pub fn interpreted(params: Value, body: Value) -> ProcRef {
        Rc::new(Procedure {
            name: RefCell::new(String::new()),
            is_macro: std::cell::Cell::new(false),
            kind: ProcedureKind::Interpreted { params, body },
        })
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    pub fn is_macro(&self) -> bool {
        self.is_macro.get()
    }

    pub fn set_macro(&self, is_macro: bool) {
        self.is_macro.set(is_macro);
    }

    /// Native arity, `None` for interpreted procedures
    pub fn arity(&self) -> Option<i32> {
        match &self.kind {
            ProcedureKind::Native { arity, .. } => Some(*arity),
            ProcedureKind::Interpreted { .. } => None,
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match &self.kind {
            ProcedureKind::Native { arity, .. } => format!("native/{}", arity),
            ProcedureKind::Interpreted { .. } => "interpreted".to_string(),
        };
        f.debug_struct("Procedure")
            .field("name", &self.name())
            .field("is_macro", &self.is_macro())
            .field("kind", &kind)
            .finish()
    }
}

impl Value {
    pub const TRUE: Value = Value::Special(Special::True);
    pub const FALSE: Value = Value::Special(Special::False);
    pub const UNDEF: Value = Value::Special(Special::Undef);

    /// Allocate a new pair
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Cell(Rc::new(RefCell::new(Pair { car, cdr })))
    }

    /// Build a proper list
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        let items: Vec<Value> = items.into_iter().collect();
        Self::list_with_tail(items, Value::Nil)
    }

    /// Build a list whose last cdr is `tail`
    pub fn list_with_tail(items: Vec<Value>, tail: Value) -> Value {
        items
            .into_iter()
            .rev()
            .fold(tail, |acc, item| Value::cons(item, acc))
    }

    /// Convert an iterator over list elements; the remaining tail is available afterwards
    pub fn iter(&self) -> ListIter {
        ListIter {
            cur: self.clone(),
            slow: self.clone(),
            steps: 0,
        }
    }

    /// Collect a proper list into a vector
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        let mut iter = self.iter();
        let items: Vec<Value> = iter.by_ref().collect();
        match iter.rest() {
            Value::Nil => Ok(items),
            Value::Cell(_) => Err(Error::type_mismatch("list", "circular list")),
            _ => Err(Error::type_mismatch("list", "improper list")),
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "nil",
            Value::Special(_) => "special",
            Value::Number(_) => "number",
            Value::Atom(_) => "atom",
            Value::Cell(_) => "cell",
            Value::String(_) => "string",
            Value::Procedure(_) => "procedure",
            Value::Custom(_) => "custom",
        }
        .to_string()
    }

    /// Everything except `()` and `#f` is true
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Special(Special::False))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, Value::Cell(_))
    }

    /// True if this is exactly the atom `atom`
    pub fn is_atom(&self, atom: Atom) -> bool {
        matches!(self, Value::Atom(a) if *a == atom)
    }

    pub fn as_number(&self) -> Result<i64> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => Err(self.mismatch("number")),
        }
    }

    pub fn as_atom(&self) -> Result<Atom> {
        match self {
            Value::Atom(a) => Ok(*a),
            _ => Err(self.mismatch("atom")),
        }
    }

    pub fn as_cell(&self) -> Result<&CellRef> {
        match self {
            Value::Cell(c) => Ok(c),
            _ => Err(self.mismatch("cell")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    pub fn as_procedure(&self) -> Result<&ProcRef> {
        match self {
            Value::Procedure(p) => Ok(p),
            _ => Err(self.mismatch("procedure")),
        }
    }

    pub fn as_custom(&self) -> Result<&Rc<dyn CustomObject>> {
        match self {
            Value::Custom(c) => Ok(c),
            _ => Err(self.mismatch("custom")),
        }
    }

    /// First field of a pair
    pub fn car(&self) -> Result<Value> {
        Ok(self.as_cell()?.borrow().car.clone())
    }

    /// Second field of a pair
    pub fn cdr(&self) -> Result<Value> {
        Ok(self.as_cell()?.borrow().cdr.clone())
    }

    /// Structural equality (`equal?`)
    ///
    /// Walks cdr chains iteratively. A pair of cells already under comparison
    /// counts as equal, so cyclic structures compare by shape and terminate.
    pub fn equal(&self, other: &Value) -> bool {
        let mut seen = HashSet::new();
        equal_in(self, other, &mut seen)
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::type_mismatch(expected, self.type_name())
    }
}

type CellPtr = *const RefCell<Pair>;

fn equal_in(a: &Value, b: &Value, seen: &mut HashSet<(CellPtr, CellPtr)>) -> bool {
    let (mut a, mut b) = (a.clone(), b.clone());
    loop {
        let next = match (&a, &b) {
            (Value::Cell(x), Value::Cell(y)) => {
                if Rc::ptr_eq(x, y) || !seen.insert((Rc::as_ptr(x), Rc::as_ptr(y))) {
                    return true;
                }
                let (x, y) = (x.borrow(), y.borrow());
                if !equal_in(&x.car, &y.car, seen) {
                    return false;
                }
                (x.cdr.clone(), y.cdr.clone())
            }
            _ => return a == b,
        };
        a = next.0;
        b = next.1;
    }
}

/// Identity comparison (`eq?`); strings and numbers compare by content
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Special(a), Value::Special(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a == b,
            (Value::Cell(a), Value::Cell(b)) => Rc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            (Value::Custom(a), Value::Custom(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        debug_value(self, f, 16)
    }
}

// Depth-bounded so cyclic cells still format
fn debug_value(value: &Value, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
    match value {
        Value::Nil => write!(f, "Nil"),
        Value::Special(s) => write!(f, "{:?}", s),
        Value::Number(n) => write!(f, "Number({})", n),
        Value::Atom(a) => write!(f, "Atom({})", a.id()),
        Value::String(s) => write!(f, "String({:?})", s),
        Value::Procedure(p) => write!(f, "{:?}", p),
        Value::Custom(c) => write!(f, "Custom({})", c.describe()),
        Value::Cell(_) if depth == 0 => write!(f, "Cell(..)"),
        Value::Cell(c) => {
            let pair = c.borrow();
            write!(f, "Cell(")?;
            debug_value(&pair.car, f, depth - 1)?;
            write!(f, ", ")?;
            debug_value(&pair.cdr, f, depth - 1)?;
            write!(f, ")")
        }
    }
}

/// Iterator over the elements of a (possibly improper) list
pub struct ListIter {
    cur: Value,
    /// Trails `cur` at half speed; meeting it means the spine is circular
    slow: Value,
    steps: usize,
}

impl ListIter {
    /// Whatever follows the last element yielded so far: `()` for a fully
    /// consumed proper list, the dotted tail otherwise
    ///
    /// On a circular list iteration stops once the cycle is detected and
    /// `rest` is a pair.
    pub fn rest(&self) -> Value {
        self.cur.clone()
    }

    fn in_cycle(&self) -> bool {
        match (&self.cur, &self.slow) {
            (Value::Cell(a), Value::Cell(b)) => self.steps > 0 && Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Iterator for ListIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.in_cycle() {
            return None;
        }
        let (car, cdr) = match &self.cur {
            Value::Cell(c) => {
                let pair = c.borrow();
                (pair.car.clone(), pair.cdr.clone())
            }
            _ => return None,
        };
        self.cur = cdr;
        self.steps += 1;
        if self.steps % 2 == 0 {
            let next = match &self.slow {
                Value::Cell(c) => c.borrow().cdr.clone(),
                other => other.clone(),
            };
            self.slow = next;
        }
        Some(car)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Atom> for Value {
    fn from(a: Atom) -> Self {
        Value::Atom(a)
    }
}

impl From<CellRef> for Value {
    fn from(c: CellRef) -> Self {
        Value::Cell(c)
    }
}

impl From<ProcRef> for Value {
    fn from(p: ProcRef) -> Self {
        Value::Procedure(p)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::UNDEF
    }
}
