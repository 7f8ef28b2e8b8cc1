use serde::{Deserialize, Serialize};
use std::fmt;

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    /// Returns true for the end-of-stream sentinel
    pub fn is_eos(&self) -> bool {
        matches!(self.kind, TokenKind::Eos)
    }

    /// Returns true if this is the single-character symbol `c`
    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol(c)
    }
}

/// All token kinds produced by the scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    /// End of stream (also produced early on input no pattern matches)
    Eos,
    /// Integer literal (digit run)
    Integer(i64),
    /// Identifier
    Identifier(String),
    /// Single-character symbol: delimiters, `.`, and reader-macro characters
    Symbol(char),
    /// String literal, escapes already resolved
    String(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Eos => write!(f, "#EOF"),
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Symbol(c) => write!(f, "{}", c),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
        }
    }
}
