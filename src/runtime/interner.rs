//! Atom interning
//!
//! Every engine owns one [`Interner`]. Atoms are small integer ids, so atom
//! equality is id equality and environment frames key on ids.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An interned symbol id
///
/// Only an [`Interner`] hands these out, so every atom resolves back to a name
/// in the interner that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// Numeric id of the atom within its interner
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#<atom {}>", self.0)
    }
}

/// Atoms interned by every [`Interner`] at construction, in this order
pub mod sym {
    use super::Atom;

    pub const BEGIN: Atom = Atom(0);
    pub const DEFINE: Atom = Atom(1);
    pub const SET: Atom = Atom(2);
    pub const IF: Atom = Atom(3);
    pub const LAMBDA: Atom = Atom(4);
    pub const QUOTE: Atom = Atom(5);
    pub const LOOP: Atom = Atom(6);
    pub const LET: Atom = Atom(7);
    pub const COND: Atom = Atom(8);
    pub const ELSE: Atom = Atom(9);
    pub const QUASIQUOTE: Atom = Atom(10);
    pub const UNQUOTE: Atom = Atom(11);
    pub const UNQUOTE_SPLICING: Atom = Atom(12);
    pub const LIST: Atom = Atom(13);
    pub const CONS: Atom = Atom(14);
    pub const APPEND: Atom = Atom(15);
    pub const PROCEDURE_SET_NAME: Atom = Atom(16);
    pub const PROCEDURE_SET_MACRO: Atom = Atom(17);

    pub(super) const NAMES: [&str; 18] = [
        "begin",
        "define",
        "set!",
        "if",
        "lambda",
        "quote",
        "loop",
        "let",
        "cond",
        "else",
        "quasiquote",
        "unquote",
        "unquote-splicing",
        "list",
        "cons",
        "append",
        "procedure-set-name!",
        "procedure-set-macro!",
    ];
}

/// Special forms the evaluator dispatches on directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Begin,
    Define,
    Set,
    If,
    Lambda,
    Quote,
    Loop,
}

impl SpecialForm {
    /// The special form tagged by `atom`, if any
    pub fn from_atom(atom: Atom) -> Option<Self> {
        match atom {
            sym::BEGIN => Some(SpecialForm::Begin),
            sym::DEFINE => Some(SpecialForm::Define),
            sym::SET => Some(SpecialForm::Set),
            sym::IF => Some(SpecialForm::If),
            sym::LAMBDA => Some(SpecialForm::Lambda),
            sym::QUOTE => Some(SpecialForm::Quote),
            sym::LOOP => Some(SpecialForm::Loop),
            _ => None,
        }
    }
}

/// Bidirectional name/id table
#[derive(Debug, Clone)]
pub struct Interner {
    ids: HashMap<Rc<str>, Atom>,
    names: Vec<Rc<str>>,
}

impl Interner {
    /// Creates an interner holding the well-known atoms in [`sym`]
    pub fn new() -> Self {
        let mut interner = Interner {
            ids: HashMap::new(),
            names: Vec::new(),
        };
        for name in sym::NAMES {
            interner.intern(name);
        }
        interner
    }

    /// Returns the atom for `name`, allocating a new id on first sight
    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(atom) = self.ids.get(name) {
            return *atom;
        }
        let atom = Atom(self.names.len() as u32);
        let name: Rc<str> = Rc::from(name);
        self.names.push(name.clone());
        self.ids.insert(name, atom);
        atom
    }

    /// Returns the atom for `name` without interning it
    pub fn lookup(&self, name: &str) -> Option<Atom> {
        self.ids.get(name).copied()
    }

    /// Name of an atom
    pub fn name(&self, atom: Atom) -> &str {
        self.names
            .get(atom.0 as usize)
            .map(|n| n.as_ref())
            .unwrap_or("#<invalid-atom>")
    }

    /// Number of interned atoms
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the well-known atoms are interned at construction
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
