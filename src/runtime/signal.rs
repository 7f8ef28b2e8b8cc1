//! Non-error control transfer
//!
//! `break` unwinds to the nearest enclosing `loop` through the same `?`
//! plumbing as errors, but on its own variant so that code matching on
//! [`Error`] can never swallow it.

use crate::error::Error;
use crate::runtime::Value;

/// Either a real error or a loop escape carrying its result
#[derive(Debug, Clone)]
pub enum Signal {
    /// An error from the taxonomy in [`Error`]
    Error(Error),
    /// `(break value)` looking for its `loop`
    Break(Value),
}

/// Result of evaluating anything that may run `break`
pub type Flow<T> = std::result::Result<T, Signal>;

impl From<Error> for Signal {
    fn from(err: Error) -> Self {
        Signal::Error(err)
    }
}

impl Signal {
    /// Convert at the engine boundary, where no `loop` is left to catch a break
    pub fn into_error(self) -> Error {
        match self {
            Signal::Error(err) => err,
            Signal::Break(_) => Error::internal("break outside of loop"),
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Signal::Break(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSeverity;

    fn fails() -> Flow<i64> {
        Err(Error::DivisionByZero)?;
        Ok(1)
    }

    #[test]
    fn test_error_lifts_into_signal() {
        assert!(matches!(fails(), Err(Signal::Error(Error::DivisionByZero))));
    }

    #[test]
    fn test_escaped_break_is_fatal() {
        let err = Signal::Break(Value::Number(3)).into_error();
        assert_eq!(err.classify(), ErrorSeverity::Fatal);
        assert!(Signal::Break(Value::Nil).is_break());
    }
}
