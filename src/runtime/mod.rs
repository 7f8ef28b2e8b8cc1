//! Runtime: values, environments, the macro pass and the evaluator

pub mod compiler;
pub mod engine;
pub mod environment;
pub mod interner;
pub mod lisp_evaluator;
pub mod native;
pub mod printer;
pub mod quasiquote;
pub mod signal;
pub mod value;

pub use compiler::Compiler;
pub use engine::{Engine, EngineConfig};
pub use environment::Env;
pub use interner::{sym, Atom, Interner, SpecialForm};
pub use lisp_evaluator::LispEvaluator;
pub use native::{variadic, FromValue, IntoFlow, IntoNative};
pub use signal::{Flow, Signal};
pub use value::{
    CellRef, CustomObject, NativeFn, Pair, ProcRef, Procedure, ProcedureKind, Special, Value,
};
