use super::token::{Token, TokenKind};
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

// Token patterns, tried in this order at the current position
lazy_static! {
    static ref RE_INTEGER: Regex = Regex::new(r"^-?[0-9]+").unwrap();
    static ref RE_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_+\-*/<>=!?%&$:][A-Za-z0-9_+\-*/<>=!?%&$:.]*").unwrap();
    static ref RE_STRING: Regex = Regex::new(r#"^"((?s:[^"\\]|\\.)*)""#).unwrap();
    static ref RE_SYMBOL: Regex = Regex::new(r"^[()\[\]{}.#\\'`,@;]").unwrap();
    static ref RE_SPACES: Regex = Regex::new(r"^\s+").unwrap();
    static ref RE_LINE_COMMENT: Regex = Regex::new(r"^;[^\n]*(?:\n|$)").unwrap();
}

/// Scanner for S-expression source with single-token pushback
///
/// The reader pulls tokens one at a time with [`next`](Self::next) and may
/// push the last one back exactly once with [`unread`](Self::unread).
/// Whitespace, `;` line comments and `#;` datum comments never reach the reader.
pub struct SExprScanner {
    /// Source text
    source: String,
    /// Byte offset of the scan position
    pos: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Last token handed out by `next`
    last: Option<Token>,
    /// `last` was pushed back and is returned by the next `next`
    pushed_back: bool,
}

impl SExprScanner {
    /// Creates a new S-expression scanner from source code
    pub fn new(source: &str) -> Self {
        SExprScanner {
            source: source.to_string(),
            pos: 0,
            line: 1,
            column: 1,
            last: None,
            pushed_back: false,
        }
    }

    /// Reads the next token, or the pushed-back one if `unread` was called
    pub fn next(&mut self) -> Result<Token> {
        if self.pushed_back {
            if let Some(token) = &self.last {
                self.pushed_back = false;
                return Ok(token.clone());
            }
        }

        self.skip_trivia()?;
        let token = self.scan()?;
        self.last = Some(token.clone());
        Ok(token)
    }

    /// Pushes the last token back; fails if it was already pushed back
    pub fn unread(&mut self) -> Result<()> {
        if self.pushed_back {
            return Err(Error::LexerMisuse(
                "unread called twice without an intervening read".to_string(),
            ));
        }
        if self.last.is_none() {
            return Err(Error::LexerMisuse("unread before any read".to_string()));
        }
        self.pushed_back = true;
        Ok(())
    }

    /// Returns the next token without consuming it
    pub fn peek(&mut self) -> Result<Token> {
        let token = self.next()?;
        self.unread()?;
        Ok(token)
    }

    /// Discards the next token
    pub fn consume(&mut self) -> Result<()> {
        self.next().map(|_| ())
    }

    /// The raw character right after the last scanned token
    pub fn peek_char(&self) -> Option<char> {
        if self.pushed_back {
            return None;
        }
        self.rest().chars().next()
    }

    /// Scans all remaining tokens, ending with the end-of-stream token
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next()?;
            let done = token.is_eos();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Current line number (1-indexed)
    pub fn line(&self) -> usize {
        self.line
    }

    /// Current column number (1-indexed)
    pub fn column(&self) -> usize {
        self.column
    }

    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn advance(&mut self, len: usize) {
        let end = self.pos + len;
        for c in self.source[self.pos..end].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos = end;
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            if let Some(m) = RE_SPACES.find(self.rest()) {
                let len = m.end();
                self.advance(len);
            } else if let Some(m) = RE_LINE_COMMENT.find(self.rest()) {
                let len = m.end();
                self.advance(len);
            } else if self.rest().starts_with("#;") {
                self.advance(2);
                self.skip_datum()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Discards one complete datum at the token level
    fn skip_datum(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            self.skip_trivia()?;
            if depth == 0 && self.rest().starts_with([')', ']', '}']) {
                // nothing left to discard inside the enclosing list
                return Ok(());
            }

            let token = self.scan()?;
            match token.kind {
                TokenKind::Eos => return Ok(()),
                TokenKind::Symbol('(' | '[' | '{') => depth += 1,
                TokenKind::Symbol(')' | ']' | '}') => depth = depth.saturating_sub(1),
                TokenKind::Symbol('\'' | '`' | ',' | '@' | '#') => continue,
                _ => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    fn scan(&mut self) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        let rest = self.rest();

        if rest.is_empty() {
            return Ok(Token::new(TokenKind::Eos, String::new(), line, column));
        }

        let (kind, lexeme) = if let Some(m) = RE_INTEGER.find(rest) {
            let text = m.as_str().to_string();
            let value: i64 = text.parse().map_err(|_| Error::SyntaxError {
                line,
                col: column,
                message: format!("integer literal out of range: {}", text),
            })?;
            (TokenKind::Integer(value), text)
        } else if let Some(m) = RE_IDENTIFIER.find(rest) {
            let text = m.as_str().to_string();
            (TokenKind::Identifier(text.clone()), text)
        } else if let Some(caps) = RE_STRING.captures(rest) {
            let text = caps[0].to_string();
            let value = unescape(&caps[1]).map_err(|message| Error::SyntaxError {
                line,
                col: column,
                message,
            })?;
            (TokenKind::String(value), text)
        } else if let Some(m) = RE_SYMBOL.find(rest) {
            let text = m.as_str().to_string();
            match text.chars().next() {
                Some(c) => (TokenKind::Symbol(c), text),
                None => return Err(Error::internal("empty symbol match")),
            }
        } else {
            tracing::debug!(line, column, "no token pattern matches, ending stream");
            return Ok(Token::new(TokenKind::Eos, String::new(), line, column));
        };

        self.advance(lexeme.len());
        Ok(Token::new(kind, lexeme, line, column))
    }
}

/// Resolves `\n`, `\t`, `\\` and `\"` escapes in a string literal body
fn unescape(body: &str) -> std::result::Result<String, String> {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('\\') => value.push('\\'),
            Some('"') => value.push('"'),
            Some(other) => return Err(format!("invalid escape sequence \\{}", other)),
            None => return Err("dangling backslash in string".to_string()),
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = SExprScanner::new(source);
        scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_sexpr() {
        assert_eq!(
            kinds("(+ 1 2)"),
            vec![
                TokenKind::Symbol('('),
                TokenKind::Identifier("+".to_string()),
                TokenKind::Integer(1),
                TokenKind::Integer(2),
                TokenKind::Symbol(')'),
                TokenKind::Eos,
            ]
        );
    }

    #[test]
    fn test_identifier_classes() {
        assert_eq!(
            kinds("set! string->list >= a.b"),
            vec![
                TokenKind::Identifier("set!".to_string()),
                TokenKind::Identifier("string->list".to_string()),
                TokenKind::Identifier(">=".to_string()),
                TokenKind::Identifier("a.b".to_string()),
                TokenKind::Eos,
            ]
        );
    }

    #[test]
    fn test_negative_integers() {
        assert_eq!(
            kinds("-42 - -x"),
            vec![
                TokenKind::Integer(-42),
                TokenKind::Identifier("-".to_string()),
                TokenKind::Identifier("-x".to_string()),
                TokenKind::Eos,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\\c\"d""#),
            vec![TokenKind::String("a\nb\\c\"d".to_string()), TokenKind::Eos]
        );
    }

    #[test]
    fn test_invalid_escape_is_syntax_error() {
        let mut scanner = SExprScanner::new(r#""a\qb""#);
        assert!(matches!(scanner.next(), Err(Error::SyntaxError { .. })));
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(
            kinds("; comment\n 1 ;trailing"),
            vec![TokenKind::Integer(1), TokenKind::Eos]
        );
    }

    #[test]
    fn test_datum_comment_skips_whole_list() {
        assert_eq!(
            kinds("(1 #;(2 (3)) 4)"),
            vec![
                TokenKind::Symbol('('),
                TokenKind::Integer(1),
                TokenKind::Integer(4),
                TokenKind::Symbol(')'),
                TokenKind::Eos,
            ]
        );
    }

    #[test]
    fn test_datum_comment_before_closer() {
        assert_eq!(
            kinds("(1 #;2)"),
            vec![
                TokenKind::Symbol('('),
                TokenKind::Integer(1),
                TokenKind::Symbol(')'),
                TokenKind::Eos,
            ]
        );
        assert_eq!(
            kinds("(#;(2) )"),
            vec![TokenKind::Symbol('('), TokenKind::Symbol(')'), TokenKind::Eos]
        );
    }

    #[test]
    fn test_datum_comment_skips_quoted_datum() {
        assert_eq!(kinds("#;'(a b) 7"), vec![TokenKind::Integer(7), TokenKind::Eos]);
    }

    #[test]
    fn test_malformed_input_ends_stream() {
        assert_eq!(kinds("1 ~ 2"), vec![TokenKind::Integer(1), TokenKind::Eos]);
    }

    #[test]
    fn test_unread_once() {
        let mut scanner = SExprScanner::new("a b");
        let first = scanner.next().unwrap();
        scanner.unread().unwrap();
        assert_eq!(scanner.next().unwrap(), first);
        assert_eq!(
            scanner.next().unwrap().kind,
            TokenKind::Identifier("b".to_string())
        );
    }

    #[test]
    fn test_unread_twice_is_misuse() {
        let mut scanner = SExprScanner::new("a");
        scanner.next().unwrap();
        scanner.unread().unwrap();
        assert!(matches!(scanner.unread(), Err(Error::LexerMisuse(_))));
    }

    #[test]
    fn test_unread_before_read_is_misuse() {
        let mut scanner = SExprScanner::new("a");
        assert!(matches!(scanner.unread(), Err(Error::LexerMisuse(_))));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut scanner = SExprScanner::new("x");
        assert_eq!(scanner.peek().unwrap(), scanner.next().unwrap());
        assert!(scanner.next().unwrap().is_eos());
    }

    #[test]
    fn test_positions() {
        let mut scanner = SExprScanner::new("(a\n  bc)");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (1, 2));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_unquote_splicing_chars() {
        let mut scanner = SExprScanner::new(",@x");
        assert!(scanner.next().unwrap().is_symbol(','));
        assert_eq!(scanner.peek_char(), Some('@'));
    }

    #[test]
    fn test_integer_overflow() {
        let mut scanner = SExprScanner::new("99999999999999999999999");
        assert!(matches!(scanner.next(), Err(Error::SyntaxError { .. })));
    }
}
