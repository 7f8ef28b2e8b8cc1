//! Lexical analysis for lispcore
//!
//! Converts source text into a stream of tokens with single-token pushback.

mod sexpr_scanner;
mod token;

pub use sexpr_scanner::SExprScanner;
pub use token::{Token, TokenKind};
