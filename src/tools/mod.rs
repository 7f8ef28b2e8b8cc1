//! Native procedure registration
//!
//! Natives are bound into an engine's root environment through a [`Registry`].

pub mod stdlib;

use crate::runtime::lisp_evaluator::LispEvaluator;
use crate::runtime::native::{self, IntoFlow, IntoNative};
use crate::runtime::{Engine, NativeFn, ProcRef, Procedure, Value};
use std::rc::Rc;

/// Binds native procedures into the root environment of one engine
pub struct Registry<'e> {
    engine: &'e mut Engine,
    registered: Vec<String>,
}

impl<'e> Registry<'e> {
    pub fn new(engine: &'e mut Engine) -> Self {
        Registry {
            engine,
            registered: Vec::new(),
        }
    }

    /// Register a typed function; its arity is the number of typed parameters
    pub fn function<Args, F>(&mut self, name: &str, f: F) -> ProcRef
    where
        F: IntoNative<Args>,
    {
        self.bind(name, F::ARITY, f.into_native())
    }

    /// Register a function receiving the whole argument list (arity -1)
    pub fn variadic<F, R>(&mut self, name: &str, f: F) -> ProcRef
    where
        F: for<'c, 'a> Fn(&'c mut LispEvaluator<'a>, Value) -> R + 'static,
        R: IntoFlow,
    {
        self.bind(name, -1, native::variadic(f))
    }

    /// Register a typed macro; it receives unevaluated operands at expansion time
    pub fn macro_fn<Args, F>(&mut self, name: &str, f: F) -> ProcRef
    where
        F: IntoNative<Args>,
    {
        let proc = self.function(name, f);
        proc.set_macro(true);
        proc
    }

    /// Register a macro receiving its whole unevaluated operand list
    pub fn variadic_macro<F, R>(&mut self, name: &str, f: F) -> ProcRef
    where
        F: for<'c, 'a> Fn(&'c mut LispEvaluator<'a>, Value) -> R + 'static,
        R: IntoFlow,
    {
        let proc = self.variadic(name, f);
        proc.set_macro(true);
        proc
    }

    /// Check if `name` is bound in the root environment
    pub fn has(&self, name: &str) -> bool {
        self.engine.lookup_global(name).is_some()
    }

    /// Names registered through this registry, in registration order
    pub fn registered(&self) -> &[String] {
        &self.registered
    }

    fn bind(&mut self, name: &str, arity: i32, func: Rc<NativeFn>) -> ProcRef {
        let proc = Procedure::native(name, arity, func);
        self.engine
            .define_global(name, Value::Procedure(proc.clone()));
        self.registered.push(name.to_string());
        proc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::runtime::EngineConfig;

    fn answer(_ctx: &mut LispEvaluator<'_>) -> Result<i64> {
        Ok(42)
    }

    fn first(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
        args.car()
    }

    fn bare_engine() -> Engine {
        Engine::with_config(EngineConfig {
            load_stdlib: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_registration() {
        let mut engine = bare_engine();
        engine.register(|r| {
            r.function("answer", answer);
            assert!(r.has("answer"));
            assert!(!r.has("unknown"));
            assert_eq!(r.registered(), ["answer".to_string()]);
        });
        assert_eq!(engine.run("(answer)").unwrap(), Value::Number(42));
    }

    #[test]
    fn test_registered_arity() {
        let mut engine = bare_engine();
        engine.register(|r| {
            assert_eq!(r.function("answer", answer).arity(), Some(0));
            assert_eq!(r.variadic("first", first).arity(), Some(-1));
        });
    }

    #[test]
    fn test_macro_receives_unevaluated_operands() {
        let mut engine = bare_engine();
        engine.register(|r| {
            let proc = r.variadic_macro("first-operand", first);
            assert!(proc.is_macro());
        });
        // (undefined-name) is never evaluated
        let result = engine.run("(first-operand 7 (undefined-name))").unwrap();
        assert_eq!(result, Value::Number(7));
    }
}
