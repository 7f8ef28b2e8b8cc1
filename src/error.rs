//! Error types for the lispcore engine

use thiserror::Error;

/// Engine errors
///
/// Every kind is recoverable at the embedding boundary. While an error unwinds
/// through nested forms the evaluator wraps it in [`Error::Traced`], so the
/// outermost report carries an innermost-to-outermost list of printed forms.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Reader errors
    /// Malformed token stream or malformed list/dotted-pair structure
    ///
    /// **Triggered by:** `(. a)`, `(a . b c)`, `)` at top level, `#x`
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Input exhausted at a top-level form boundary
    #[error("End of source")]
    EndOfSource,

    /// Lexer pushback used twice without an intervening read
    #[error("Lexer misuse: {0}")]
    LexerMisuse(String),

    // Runtime errors
    /// Atom lookup or `set!` target not bound anywhere in the chain
    ///
    /// **Example:** `x` (when x was never defined), `(set! y 1)` before `(define y ...)`
    #[error("Unbound variable: {name}")]
    UnboundVariable {
        /// Variable name
        name: String,
    },

    /// Value accessed under the wrong tag
    ///
    /// **Triggered by:** `(car 1)`, `(string-length 'a)`, native parameter conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Too few (or, for fixed interpreted parameter lists, too many) arguments
    #[error("Arity mismatch: expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        got: usize,
    },

    /// Attempt to apply a non-procedure value
    #[error("Value is not callable: {type_name}")]
    NotCallable {
        /// Type of non-callable value
        type_name: String,
    },

    /// Macro call with a shape the macro cannot handle
    #[error("Macro expansion error: {0}")]
    MacroExpansionError(String),

    /// Special form or list with an invalid shape
    #[error("Malformed form: {0}")]
    MalformedForm(String),

    /// Integer division or modulo by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Failure reading a source file
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File path
        path: String,
        /// Error message from the OS
        message: String,
    },

    /// Engine configuration document could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A state the engine considers unreachable; always a core bug
    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),

    /// An error together with the printed forms it unwound through
    #[error("{error}")]
    Traced {
        /// Underlying error
        error: Box<Error>,
        /// Printed forms, innermost first
        trace: Vec<String>,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Signals a bug in the engine itself
    Fatal,
    /// The host may report the error and keep using the engine
    Recoverable,
}

impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create a malformed form error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedForm(msg.into())
    }

    /// Create an internal invariant violation
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::InternalInvariantViolation(msg.into())
    }

    /// Append a printed form to the trace, wrapping the error on first use
    pub fn with_frame(self, form: impl Into<String>) -> Self {
        match self {
            Error::Traced { error, mut trace } => {
                trace.push(form.into());
                Error::Traced { error, trace }
            }
            other => Error::Traced {
                error: Box::new(other),
                trace: vec![form.into()],
            },
        }
    }

    /// The underlying error kind, with any trace wrapper removed
    pub fn kind(&self) -> &Error {
        match self {
            Error::Traced { error, .. } => error.kind(),
            other => other,
        }
    }

    /// Printed forms the error unwound through, innermost first
    pub fn trace(&self) -> &[String] {
        match self {
            Error::Traced { trace, .. } => trace,
            _ => &[],
        }
    }

    /// Render the trace followed by the message
    ///
    /// ```text
    /// 0: (car 1)
    /// 1: (f 1)
    /// error: Type mismatch: expected cell, got number
    /// ```
    pub fn stack_trace(&self) -> String {
        let mut out = String::new();
        for (i, form) in self.trace().iter().enumerate() {
            out.push_str(&format!("{}: {}\n", i, form));
        }
        out.push_str(&format!("error: {}\n", self.kind()));
        out
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self.kind() {
            Error::InternalInvariantViolation(_) => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for lispcore operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_grows_innermost_first() {
        let err = Error::UnboundVariable {
            name: "x".to_string(),
        }
        .with_frame("(f x)")
        .with_frame("(g (f x))");

        assert_eq!(err.trace(), &["(f x)".to_string(), "(g (f x))".to_string()]);
        assert!(matches!(err.kind(), Error::UnboundVariable { name } if name == "x"));
        assert_eq!(err.to_string(), "Unbound variable: x");
    }

    #[test]
    fn test_stack_trace_format() {
        let err = Error::DivisionByZero.with_frame("(/ 1 0)");
        assert_eq!(err.stack_trace(), "0: (/ 1 0)\nerror: Division by zero\n");
    }

    #[test]
    fn test_untraced_error_has_empty_trace() {
        let err = Error::EndOfSource;
        assert!(err.trace().is_empty());
        assert_eq!(err.stack_trace(), "error: End of source\n");
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            Error::internal("bug").with_frame("(x)").classify(),
            ErrorSeverity::Fatal
        );
        assert_eq!(
            Error::type_mismatch("number", "string").classify(),
            ErrorSeverity::Recoverable
        );
    }
}
