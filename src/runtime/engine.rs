use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::SExprParser;
use crate::runtime::interner::{Atom, Interner};
use crate::runtime::lisp_evaluator::LispEvaluator;
use crate::runtime::printer;
use crate::runtime::signal::Signal;
use crate::runtime::{Env, Value};
use crate::tools::{stdlib, Registry};

/// Engine configuration
///
/// The trace flags only add log output; they never change results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Log every expanded form before execution
    pub trace_expanded: bool,
    /// Log every raw form before expansion
    pub trace_raw: bool,
    /// Attach printed forms to errors as they unwind
    pub stack_trace: bool,
    /// Max characters of each printed form stored in a trace
    pub trace_form_width: usize,
    /// Register the standard library at construction
    pub load_stdlib: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            trace_expanded: false,
            trace_raw: false,
            stack_trace: true,
            trace_form_width: 80,
            load_stdlib: true,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// One independent interpreter instance
///
/// Owns the atom table, the root environment and the configuration. Engines
/// share nothing, so several can coexist on one thread.
pub struct Engine {
    interner: Interner,
    root: Env,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine with the default configuration and the standard library
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let load_stdlib = config.load_stdlib;
        let mut engine = Engine {
            interner: Interner::new(),
            root: Env::new_root(),
            config,
        };
        if load_stdlib {
            engine.register(stdlib::register_all);
        }
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, name: &str) -> Atom {
        self.interner.intern(name)
    }

    pub fn atom_name(&self, atom: Atom) -> &str {
        self.interner.name(atom)
    }

    /// The global environment
    pub fn root(&self) -> &Env {
        &self.root
    }

    /// Binds `name` in the root environment
    pub fn define_global(&mut self, name: &str, value: Value) {
        let atom = self.intern(name);
        self.root.define(atom, value);
    }

    /// Looks `name` up in the root environment
    pub fn lookup_global(&self, name: &str) -> Option<Value> {
        self.interner.lookup(name).and_then(|atom| self.root.get(atom))
    }

    /// Binds natives through a [`Registry`]
    pub fn register<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Registry<'_>),
    {
        let mut registry = Registry::new(self);
        f(&mut registry);
    }

    /// Reads every top-level form without expanding or evaluating
    pub fn read_all(&mut self, source: &str) -> Result<Vec<Value>> {
        SExprParser::new(source).read_all(&mut self.interner)
    }

    /// Runs the macro-expansion pass over one form
    pub fn compile(&mut self, code: &Value) -> Result<Value> {
        LispEvaluator::new(self).compile(code)
    }

    /// Evaluates already-expanded code in the root environment
    pub fn eval(&mut self, code: &Value) -> Result<Value> {
        let result = LispEvaluator::new(self).eval(code);
        result.map_err(escaped)
    }

    /// Reads, expands and evaluates every top-level form in order
    ///
    /// Returns the last result, or `()` for empty input.
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let mut parser = SExprParser::new(source);
        let mut last = Value::Nil;
        loop {
            let form = match parser.read(&mut self.interner) {
                Ok(form) => form,
                Err(Error::EndOfSource) => return Ok(last),
                Err(e) => return Err(e),
            };
            if self.config.trace_raw {
                tracing::info!(target: "lispcore::trace", form = %self.print(&form), "read");
            }
            let expanded = self.compile(&form)?;
            if self.config.trace_expanded {
                tracing::info!(target: "lispcore::trace", form = %self.print(&expanded), "expanded");
            }
            last = self.eval(&expanded)?;
        }
    }

    /// Runs a source file
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading source file");
        let source = fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.run(&source)
    }

    /// Applies a procedure value from the host
    pub fn call(&mut self, proc: &Value, args: Vec<Value>) -> Result<Value> {
        let result = LispEvaluator::new(self).apply(proc, Value::list(args));
        result.map_err(escaped)
    }

    /// Printed (`write`) form
    pub fn print(&self, value: &Value) -> String {
        printer::print(value, &self.interner)
    }

    /// Printed (`display`) form
    pub fn display(&self, value: &Value) -> String {
        printer::display(value, &self.interner)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// A signal reaching the host; a break here has no `loop` left to catch it
fn escaped(signal: Signal) -> Error {
    if let Signal::Break(value) = &signal {
        tracing::warn!(?value, "break escaped the outermost loop");
    }
    signal.into_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_run_returns_last_value() {
        let mut engine = Engine::new();
        let result = engine.run("1 2 (+ 1 2)").unwrap();
        assert_eq!(result, Value::Number(3));
    }

    #[test]
    fn test_run_empty_source() {
        let mut engine = Engine::new();
        assert_eq!(engine.run("  ; nothing\n").unwrap(), Value::Nil);
    }

    #[test]
    fn test_run_syntax_error() {
        let mut engine = Engine::new();
        assert!(matches!(engine.run("(+ 1"), Err(Error::SyntaxError { .. })));
    }

    #[test]
    fn test_forms_before_error_take_effect() {
        let mut engine = Engine::new();
        assert!(engine.run("(define a 1) (car a)").is_err());
        assert_eq!(engine.lookup_global("a"), Some(Value::Number(1)));
    }

    #[test]
    fn test_engines_are_independent() {
        let mut a = Engine::new();
        let mut b = Engine::new();
        a.run("(define only-a 1)").unwrap();
        assert!(a.lookup_global("only-a").is_some());
        assert!(b.lookup_global("only-a").is_none());
        assert!(b.run("only-a").is_err());
    }

    #[test]
    fn test_without_stdlib() {
        let mut engine = Engine::with_config(EngineConfig {
            load_stdlib: false,
            ..Default::default()
        });
        assert!(engine.lookup_global("car").is_none());
        assert_eq!(engine.run("((lambda (x) x) 4)").unwrap(), Value::Number(4));
    }

    #[test]
    fn test_define_global_and_call() {
        let mut engine = Engine::new();
        engine.define_global("base", Value::Number(10));
        let add = engine.run("(lambda (x) (+ x base))").unwrap();
        let result = engine.call(&add, vec![Value::Number(5)]).unwrap();
        assert_eq!(result, Value::Number(15));
    }

    #[test]
    fn test_call_non_procedure() {
        let mut engine = Engine::new();
        let err = engine.call(&Value::Number(1), vec![]).unwrap_err();
        assert!(matches!(err, Error::NotCallable { .. }));
    }

    #[test]
    fn test_print_and_display() {
        let mut engine = Engine::new();
        let value = engine.run(r#"(list "a" 'b)"#).unwrap();
        assert_eq!(engine.print(&value), r#"("a" b)"#);
        assert_eq!(engine.display(&value), "(a b)");
    }

    #[test]
    fn test_config_from_json() {
        let config = EngineConfig::from_json(r#"{"trace_raw": true, "trace_form_width": 20}"#)
            .unwrap();
        assert!(config.trace_raw);
        assert!(!config.trace_expanded);
        assert!(config.stack_trace);
        assert_eq!(config.trace_form_width, 20);
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"bogus": 1}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_trace_flags_do_not_change_results() {
        let mut engine = Engine::with_config(EngineConfig {
            trace_raw: true,
            trace_expanded: true,
            ..Default::default()
        });
        assert_eq!(engine.run("(if #f 1)").unwrap(), Value::UNDEF);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("lispcore-load-{}.lisp", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "(define (sq x) (* x x))").unwrap();
            writeln!(file, "(sq 9)").unwrap();
        }
        let mut engine = Engine::new();
        let result = engine.load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(result, Value::Number(81));
    }

    #[test]
    fn test_load_missing_file() {
        let mut engine = Engine::new();
        let err = engine.load("/nonexistent/lispcore/file.lisp").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
