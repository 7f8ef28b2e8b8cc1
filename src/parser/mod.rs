//! Reader for lispcore
//!
//! Turns S-expression source into value trees, one top-level form at a time.

mod sexpr_parser;

pub use sexpr_parser::SExprParser;
