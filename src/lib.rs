//! # lispcore - an embeddable S-expression interpreter
//!
//! A small Lisp core meant to be embedded in a host program: an integer and
//! string value model, mutable pair cells, interned atoms, a macro-expansion
//! pass with `defmacro` and quasiquote, and a tree-walking evaluator with a
//! `loop`/`break` control channel kept apart from the error path.
//!
//! ## Quick Start
//!
//! ```rust
//! use lispcore::{Engine, Value};
//!
//! # fn main() -> lispcore::Result<()> {
//! let mut engine = Engine::new();
//! let result = engine.run(r#"
//!     (define n 0)
//!     (loop (if (> n 2) (break n) (set! n (+ n 1))))
//! "#)?;
//! assert_eq!(result, Value::Number(3));
//! # Ok(())
//! # }
//! ```
//!
//! ### Macros
//!
//! ```rust
//! # use lispcore::Engine;
//! # fn main() -> lispcore::Result<()> {
//! let mut engine = Engine::new();
//! let result = engine.run(r#"
//!     (defmacro unless (c . body) `(if ,c #f (begin ,@body)))
//!     (unless #f 'ran)
//! "#)?;
//! assert_eq!(engine.print(&result), "ran");
//! # Ok(())
//! # }
//! ```
//!
//! ### Host functions
//!
//! Typed Rust functions become native procedures through the [`tools::Registry`]:
//!
//! ```rust
//! use lispcore::{Engine, Result};
//! use lispcore::runtime::LispEvaluator;
//!
//! fn greet(_ctx: &mut LispEvaluator<'_>, name: String) -> Result<String> {
//!     Ok(format!("hello, {}", name))
//! }
//!
//! # fn main() -> Result<()> {
//! let mut engine = Engine::new();
//! engine.register(|r| {
//!     r.function("greet", greet);
//! });
//! let result = engine.run(r#"(greet "lisp")"#)?;
//! assert_eq!(engine.display(&result), "hello, lisp");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source → SExprScanner → Tokens → SExprParser → Value tree
//!        → Compiler (macro expansion) → LispEvaluator → Value
//! ```
//!
//! - [`SExprScanner`] - Tokenizes source text
//! - [`SExprParser`] - Reads tokens into value trees
//! - [`runtime::Compiler`] - Expands macros and derived forms
//! - [`LispEvaluator`] - Evaluates expanded code
//! - [`Engine`] - Owns the atom table, root environment and configuration
//!
//! ## Error Handling
//!
//! Errors carry the printed forms they unwound through, innermost first:
//!
//! ```rust
//! # use lispcore::{Engine, Error};
//! let mut engine = Engine::new();
//! let err = engine.run("(define (f x) (car x)) (f 1)").unwrap_err();
//! assert!(matches!(err.kind(), Error::TypeMismatch { .. }));
//! assert_eq!(err.trace()[0], "(car x)");
//! ```

/// Version of the interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod tools;

// Re-export main types
pub use error::{Error, ErrorSeverity, Result};
pub use lexer::{SExprScanner, Token, TokenKind};
pub use parser::SExprParser;
pub use runtime::{Atom, Engine, EngineConfig, Env, LispEvaluator, Procedure, Signal, Value};
pub use tools::Registry;

/// Type alias for the S-expression scanner (lexer).
pub type Scanner = SExprScanner;

/// Type alias for the S-expression parser (reader).
pub type Parser = SExprParser;
