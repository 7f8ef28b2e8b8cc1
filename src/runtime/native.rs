//! Adapter turning typed Rust functions into uniform native procedures
//!
//! A native procedure receives its evaluated arguments as one list. This
//! module destructures that list for functions with a fixed number of typed
//! parameters:
//!
//! ```
//! use lispcore::{Engine, Result};
//! use lispcore::runtime::LispEvaluator;
//!
//! fn square(_ctx: &mut LispEvaluator<'_>, n: i64) -> Result<i64> {
//!     Ok(n * n)
//! }
//!
//! let mut engine = Engine::new();
//! engine.register(|r| {
//!     r.function("square", square);
//! });
//! let result = engine.run("(square 7)").unwrap();
//! assert_eq!(engine.print(&result), "49");
//! ```
//!
//! Pass function items rather than closures: the adapter requires the
//! function to accept an evaluator of any lifetime.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::runtime::interner::Atom;
use crate::runtime::lisp_evaluator::LispEvaluator;
use crate::runtime::signal::{Flow, Signal};
use crate::runtime::value::{CellRef, NativeFn, ProcRef, Value};

/// Conversion from an argument value to a typed parameter
///
/// Fails with [`Error::TypeMismatch`] when the value carries the wrong tag.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_number()
    }
}

/// Truthiness, so any value is accepted
impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value.is_truthy())
    }
}

impl FromValue for Rc<str> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::type_mismatch("string", other.type_name())),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value.as_str()?.to_string())
    }
}

impl FromValue for Atom {
    fn from_value(value: Value) -> Result<Self> {
        value.as_atom()
    }
}

impl FromValue for CellRef {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Cell(c) => Ok(c),
            other => Err(Error::type_mismatch("cell", other.type_name())),
        }
    }
}

impl FromValue for ProcRef {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Procedure(p) => Ok(p),
            other => Err(Error::type_mismatch("procedure", other.type_name())),
        }
    }
}

/// Normalizes native return types to `Flow<Value>`
pub trait IntoFlow {
    fn into_flow(self) -> Flow<Value>;
}

impl<T> IntoFlow for Result<T>
where
    T: Into<Value>,
{
    fn into_flow(self) -> Flow<Value> {
        self.map(Into::into).map_err(Signal::from)
    }
}

impl<T> IntoFlow for Flow<T>
where
    T: Into<Value>,
{
    fn into_flow(self) -> Flow<Value> {
        self.map(Into::into)
    }
}

/// Typed function convertible into a native procedure body
///
/// `Args` is the tuple of parameter types; it only exists to keep the
/// per-arity implementations apart.
pub trait IntoNative<Args> {
    /// Number of positional parameters destructured from the argument list
    const ARITY: i32;

    fn into_native(self) -> Rc<NativeFn>;
}

/// Takes the first `N` elements of an argument list
///
/// Extra trailing arguments are ignored.
pub fn spread<const N: usize>(args: Value) -> Result<[Value; N]> {
    let mut iter = args.iter();
    let mut got = 0;
    let out: [Value; N] = std::array::from_fn(|_| match iter.next() {
        Some(v) => {
            got += 1;
            v
        }
        None => Value::Nil,
    });
    if got < N {
        return Err(Error::ArityMismatch { expected: N, got });
    }
    Ok(out)
}

macro_rules! impl_into_native {
    ($arity:literal; $( $v:ident : $A:ident ),*) => {
        impl<F, R, $( $A ),*> IntoNative<( $( $A, )* )> for F
        where
            F: for<'c, 'e> Fn(&'c mut LispEvaluator<'e> $(, $A )*) -> R + 'static,
            R: IntoFlow,
            $( $A: FromValue, )*
        {
            const ARITY: i32 = $arity;

            #[allow(unused_variables)]
            fn into_native(self) -> Rc<NativeFn> {
                native_fn(move |ctx, args| {
                    let [ $( $v ),* ] = spread::<$arity>(args)?;
                    $( let $v = <$A as FromValue>::from_value($v)?; )*
                    (self)(ctx $(, $v )*).into_flow()
                })
            }
        }
    };
}

impl_into_native!(0;);
impl_into_native!(1; a0: A0);
impl_into_native!(2; a0: A0, a1: A1);
impl_into_native!(3; a0: A0, a1: A1, a2: A2);
impl_into_native!(4; a0: A0, a1: A1, a2: A2, a3: A3);
impl_into_native!(5; a0: A0, a1: A1, a2: A2, a3: A3, a4: A4);
impl_into_native!(6; a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);

/// Wraps a function that takes the whole argument list (arity -1)
pub fn variadic<F, R>(f: F) -> Rc<NativeFn>
where
    F: for<'c, 'e> Fn(&'c mut LispEvaluator<'e>, Value) -> R + 'static,
    R: IntoFlow,
{
    native_fn(move |ctx, args| f(ctx, args).into_flow())
}

fn native_fn<F>(f: F) -> Rc<NativeFn>
where
    F: for<'c, 'e> Fn(&'c mut LispEvaluator<'e>, Value) -> Flow<Value> + 'static,
{
    Rc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Engine;

    fn nums(ns: &[i64]) -> Value {
        Value::list(ns.iter().map(|n| Value::Number(*n)))
    }

    fn sub(_ctx: &mut LispEvaluator<'_>, a: i64, b: i64) -> Result<i64> {
        Ok(a - b)
    }

    fn first_char(_ctx: &mut LispEvaluator<'_>, s: String) -> Result<String> {
        Ok(s.chars().take(1).collect())
    }

    fn count_args(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<i64> {
        Ok(args.iter().count() as i64)
    }

    fn call<Args, F: IntoNative<Args>>(f: F, args: Value) -> Flow<Value> {
        let mut engine = Engine::new();
        let mut ctx = LispEvaluator::new(&mut engine);
        let native = f.into_native();
        native(&mut ctx, args)
    }

    #[test]
    fn test_spread_exact_and_trailing() {
        let [a, b] = spread::<2>(nums(&[1, 2, 3])).unwrap();
        assert_eq!((a, b), (Value::Number(1), Value::Number(2)));
    }

    #[test]
    fn test_spread_too_few() {
        let err = spread::<3>(nums(&[1])).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { expected: 3, got: 1 }));
    }

    #[test]
    fn test_typed_call() {
        let result = call(sub, nums(&[10, 4])).unwrap();
        assert_eq!(result, Value::Number(6));
    }

    fn arity_of<Args, F: IntoNative<Args>>(_f: &F) -> i32 {
        F::ARITY
    }

    #[test]
    fn test_arity_constant() {
        assert_eq!(arity_of(&sub), 2);
        assert_eq!(arity_of(&first_char), 1);
    }

    #[test]
    fn test_parameter_type_mismatch() {
        let args = Value::list(vec![Value::Number(1)]);
        match call(first_char, args) {
            Err(Signal::Error(Error::TypeMismatch { expected, got })) => {
                assert_eq!(expected, "string");
                assert_eq!(got, "number");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_variadic_receives_whole_list() {
        let mut engine = Engine::new();
        let mut ctx = LispEvaluator::new(&mut engine);
        let native = variadic(count_args);
        assert_eq!(native(&mut ctx, nums(&[1, 2, 3])).unwrap(), Value::Number(3));
        assert_eq!(native(&mut ctx, Value::Nil).unwrap(), Value::Number(0));
    }
}
