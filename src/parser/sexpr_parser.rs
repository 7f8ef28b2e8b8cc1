use crate::error::{Error, Result};
use crate::lexer::{SExprScanner, Token, TokenKind};
use crate::runtime::interner::{sym, Atom, Interner};
use crate::runtime::Value;

/// S-expression reader
///
/// Pulls tokens from an [`SExprScanner`] on demand and builds one top-level
/// value per [`read`](Self::read) call, so a driver can evaluate each form
/// before the next one is read.
pub struct SExprParser {
    scanner: SExprScanner,
}

impl SExprParser {
    /// Creates a new reader over `source`
    pub fn new(source: &str) -> Self {
        SExprParser {
            scanner: SExprScanner::new(source),
        }
    }

    /// Reads one top-level form
    ///
    /// Fails with [`Error::EndOfSource`] when the input is exhausted between forms.
    pub fn read(&mut self, interner: &mut Interner) -> Result<Value> {
        let token = self.scanner.next()?;
        if token.is_eos() {
            return Err(Error::EndOfSource);
        }
        self.datum(token, interner)
    }

    /// Reads every remaining top-level form
    pub fn read_all(&mut self, interner: &mut Interner) -> Result<Vec<Value>> {
        let mut forms = Vec::new();
        loop {
            match self.read(interner) {
                Ok(form) => forms.push(form),
                Err(Error::EndOfSource) => return Ok(forms),
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads a form that must be present (inside a list or after a prefix)
    fn read_datum(&mut self, interner: &mut Interner) -> Result<Value> {
        let token = self.scanner.next()?;
        if token.is_eos() {
            return Err(syntax_error(&token, "unexpected end of input"));
        }
        self.datum(token, interner)
    }

    fn datum(&mut self, token: Token, interner: &mut Interner) -> Result<Value> {
        match &token.kind {
            TokenKind::Integer(n) => Ok(Value::Number(*n)),
            TokenKind::Identifier(name) => Ok(Value::Atom(interner.intern(name))),
            TokenKind::String(s) => Ok(Value::from(s.as_str())),
            TokenKind::Symbol('(') => self.list(')', interner),
            TokenKind::Symbol('[') => self.list(']', interner),
            TokenKind::Symbol('{') => self.list('}', interner),
            TokenKind::Symbol('\'') => self.prefixed(sym::QUOTE, interner),
            TokenKind::Symbol('`') => self.prefixed(sym::QUASIQUOTE, interner),
            TokenKind::Symbol(',') => {
                if self.scanner.peek_char() == Some('@') {
                    self.scanner.consume()?;
                    self.prefixed(sym::UNQUOTE_SPLICING, interner)
                } else {
                    self.prefixed(sym::UNQUOTE, interner)
                }
            }
            TokenKind::Symbol('#') => self.hash_literal(&token),
            TokenKind::Symbol(c) => Err(syntax_error(&token, format!("unexpected '{}'", c))),
            TokenKind::Eos => Err(syntax_error(&token, "unexpected end of input")),
        }
    }

    /// `(`, `[` or `{` has been consumed; reads up to the matching `close`
    fn list(&mut self, close: char, interner: &mut Interner) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            let token = self.scanner.peek()?;
            match token.kind {
                TokenKind::Eos => {
                    return Err(syntax_error(&token, format!("missing '{}'", close)));
                }
                TokenKind::Symbol(c) if c == close => {
                    self.scanner.consume()?;
                    return Ok(Value::list(items));
                }
                TokenKind::Symbol(c @ (')' | ']' | '}')) => {
                    return Err(syntax_error(
                        &token,
                        format!("expected '{}' but found '{}'", close, c),
                    ));
                }
                TokenKind::Symbol('.') => {
                    self.scanner.consume()?;
                    if items.is_empty() {
                        return Err(syntax_error(&token, "'.' without a preceding element"));
                    }
                    let tail = self.read_datum(interner)?;
                    let closer = self.scanner.next()?;
                    if !closer.is_symbol(close) {
                        return Err(syntax_error(
                            &closer,
                            format!("expected '{}' after dotted tail", close),
                        ));
                    }
                    return Ok(Value::list_with_tail(items, tail));
                }
                _ => items.push(self.read_datum(interner)?),
            }
        }
    }

    /// Reader macro: `'x` becomes `(quote x)` and so on
    fn prefixed(&mut self, head: Atom, interner: &mut Interner) -> Result<Value> {
        let datum = self.read_datum(interner)?;
        Ok(Value::list(vec![Value::Atom(head), datum]))
    }

    fn hash_literal(&mut self, hash: &Token) -> Result<Value> {
        let token = self.scanner.next()?;
        match &token.kind {
            TokenKind::Identifier(name) if name == "t" => Ok(Value::TRUE),
            TokenKind::Identifier(name) if name == "f" => Ok(Value::FALSE),
            _ => Err(syntax_error(
                hash,
                format!("unknown '#' syntax: #{}", token.lexeme),
            )),
        }
    }
}

fn syntax_error(token: &Token, message: impl Into<String>) -> Error {
    Error::SyntaxError {
        line: token.line,
        col: token.column,
        message: message.into(),
    }
}
