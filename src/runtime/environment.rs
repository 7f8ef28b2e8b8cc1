use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::interner::Atom;
use crate::runtime::Value;

/// Environment for variable scoping
///
/// A chain of frames. Cloning an `Env` clones the handle, not the bindings,
/// so a child frame and everyone holding its parent see the same mutations.
#[derive(Debug, Clone)]
pub struct Env(Rc<Frame>);

/// Single frame in the chain
#[derive(Debug)]
struct Frame {
    /// Variables defined in this frame
    variables: RefCell<HashMap<Atom, Value>>,
    /// Enclosing frame (None for the root)
    parent: Option<Env>,
}

impl Env {
    /// Creates a root frame with no parent
    pub fn new_root() -> Self {
        Env(Rc::new(Frame {
            variables: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// Creates an empty frame whose parent is `self`
    pub fn child(&self) -> Self {
        Env(Rc::new(Frame {
            variables: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Gets the value of a variable, walking outward from this frame
    pub fn get(&self, name: Atom) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(val) = frame.0.variables.borrow().get(&name) {
                return Some(val.clone());
            }
            match &frame.0.parent {
                Some(parent) => frame = parent,
                None => return None,
            }
        }
    }

    /// Gets the value of a variable, or `default` if it is unbound everywhere
    pub fn get_or(&self, name: Atom, default: Value) -> Value {
        self.get(name).unwrap_or(default)
    }

    /// Defines or overwrites a variable in this frame
    pub fn define(&self, name: Atom, value: Value) {
        self.0.variables.borrow_mut().insert(name, value);
    }

    /// Mutates the nearest frame already binding `name`
    ///
    /// Returns false, binding nothing, if no frame in the chain binds it.
    pub fn set(&self, name: Atom, value: Value) -> bool {
        let mut frame = self;
        loop {
            if let Some(slot) = frame.0.variables.borrow_mut().get_mut(&name) {
                *slot = value;
                return true;
            }
            match &frame.0.parent {
                Some(parent) => frame = parent,
                None => return false,
            }
        }
    }

    /// Number of bindings local to this frame
    pub fn count(&self) -> usize {
        self.0.variables.borrow().len()
    }

    /// Enclosing frame
    pub fn parent(&self) -> Option<&Env> {
        self.0.parent.as_ref()
    }

    /// True if `other` is the same frame
    pub fn same_frame(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
