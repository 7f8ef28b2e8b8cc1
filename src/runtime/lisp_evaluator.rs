use crate::error::{Error, Result};
use crate::runtime::compiler::Compiler;
use crate::runtime::interner::{Atom, SpecialForm};
use crate::runtime::printer;
use crate::runtime::signal::{Flow, Signal};
use crate::runtime::value::{Procedure, ProcedureKind};
use crate::runtime::{Engine, Env, Value};

/// Tree-walking evaluator over macro-expanded code
///
/// Holds the engine and the current environment. Natives receive the
/// evaluator as their context, so they can intern atoms, print values,
/// call procedures or re-enter the compiler.
///
/// Special forms:
/// - `(begin form ...)` - Evaluate in order, yield the last
/// - `(define name value)` - Bind in the root environment
/// - `(set! name value)` - Mutate the nearest existing binding
/// - `(if cond then else ...)` - Conditional
/// - `(lambda params body ...)` - Procedure creation (no environment capture)
/// - `(quote datum)` - Literal data
/// - `(loop body ...)` - Repeat until `break`
pub struct LispEvaluator<'a> {
    engine: &'a mut Engine,
    env: Env,
}

impl<'a> LispEvaluator<'a> {
    /// Creates an evaluator positioned at the engine's root environment
    pub fn new(engine: &'a mut Engine) -> Self {
        let env = engine.root().clone();
        LispEvaluator { engine, env }
    }

    /// Creates an evaluator positioned at `env`
    pub fn with_env(engine: &'a mut Engine, env: Env) -> Self {
        LispEvaluator { engine, env }
    }

    /// The engine this evaluator runs in
    pub fn engine(&mut self) -> &mut Engine {
        self.engine
    }

    /// Current environment
    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn intern(&mut self, name: &str) -> Atom {
        self.engine.intern(name)
    }

    pub fn atom_name(&self, atom: Atom) -> &str {
        self.engine.atom_name(atom)
    }

    /// Printed (`write`) form of a value
    pub fn print(&self, value: &Value) -> String {
        self.engine.print(value)
    }

    /// Runs the macro-expansion pass over `code`
    pub fn compile(&mut self, code: &Value) -> Result<Value> {
        Compiler::new(self).compile(code)
    }

    /// Evaluates one expanded expression in the current environment
    pub fn eval(&mut self, code: &Value) -> Flow<Value> {
        match code {
            Value::Atom(atom) => self.env.get(*atom).ok_or_else(|| {
                Signal::Error(Error::UnboundVariable {
                    name: self.atom_name(*atom).to_string(),
                })
            }),
            Value::Cell(_) => match self.eval_form(code) {
                Ok(value) => Ok(value),
                Err(signal) => Err(self.trace(signal, code)),
            },
            other => Ok(other.clone()),
        }
    }

    /// Evaluates each form of a list in order, returning the last result
    ///
    /// An empty sequence yields `#undef`.
    pub fn eval_sequence(&mut self, body: &Value) -> Flow<Value> {
        let mut result = Value::UNDEF;
        let mut forms = body.iter();
        for form in forms.by_ref() {
            result = self.eval(&form)?;
        }
        if !forms.rest().is_nil() {
            return Err(Error::malformed("improper body sequence").into());
        }
        Ok(result)
    }

    /// Applies a procedure to an already-evaluated argument list
    pub fn apply(&mut self, proc: &Value, args: Value) -> Flow<Value> {
        let proc = match proc {
            Value::Procedure(p) => p.clone(),
            other => {
                return Err(Error::NotCallable {
                    type_name: other.type_name(),
                }
                .into())
            }
        };

        match &proc.kind {
            ProcedureKind::Native { func, .. } => {
                let func = func.clone();
                func(self, args)
            }
            ProcedureKind::Interpreted { params, body } => {
                // The new frame hangs off the caller's environment
                let frame = self.env.child();
                bind_params(&frame, params, args)?;
                let saved = std::mem::replace(&mut self.env, frame);
                let result = self.eval_sequence(body);
                self.env = saved;
                result
            }
        }
    }

    fn eval_form(&mut self, code: &Value) -> Flow<Value> {
        let head = code.car()?;
        let rest = code.cdr()?;

        if let Value::Atom(atom) = head {
            if let Some(form) = SpecialForm::from_atom(atom) {
                return self.eval_special(form, &rest);
            }
        }

        let proc = self.eval(&head)?;
        let args = self.eval_args(&rest)?;
        self.apply(&proc, args)
    }

    fn eval_args(&mut self, rest: &Value) -> Flow<Value> {
        let mut args = Vec::new();
        let mut iter = rest.iter();
        for arg in iter.by_ref() {
            args.push(self.eval(&arg)?);
        }
        if !iter.rest().is_nil() {
            return Err(Error::malformed("improper argument list").into());
        }
        Ok(Value::list(args))
    }

    fn eval_special(&mut self, form: SpecialForm, rest: &Value) -> Flow<Value> {
        match form {
            SpecialForm::Begin => self.eval_sequence(rest),
            SpecialForm::Define => self.eval_define(rest),
            SpecialForm::Set => self.eval_set(rest),
            SpecialForm::If => self.eval_if(rest),
            SpecialForm::Lambda => self.eval_lambda(rest),
            SpecialForm::Quote => Ok(form_args(rest, "quote", 1)?.remove(0)),
            SpecialForm::Loop => self.eval_loop(rest),
        }
    }

    fn eval_define(&mut self, rest: &Value) -> Flow<Value> {
        let args = form_args(rest, "define", 2)?;
        let name = args[0].as_atom()?;
        let value = self.eval(&args[1])?;
        self.engine.root().define(name, value.clone());
        Ok(value)
    }

    fn eval_set(&mut self, rest: &Value) -> Flow<Value> {
        let args = form_args(rest, "set!", 2)?;
        let name = args[0].as_atom()?;
        let value = self.eval(&args[1])?;
        if !self.env.set(name, value.clone()) {
            return Err(Error::UnboundVariable {
                name: self.atom_name(name).to_string(),
            }
            .into());
        }
        Ok(value)
    }

    fn eval_if(&mut self, rest: &Value) -> Flow<Value> {
        let cond = rest.car().map_err(|_| Error::malformed("if without condition"))?;
        let branches = rest.cdr()?;
        let then = branches
            .car()
            .map_err(|_| Error::malformed("if without then-branch"))?;

        if self.eval(&cond)?.is_truthy() {
            self.eval(&then)
        } else {
            self.eval_sequence(&branches.cdr()?)
        }
    }

    fn eval_lambda(&mut self, rest: &Value) -> Flow<Value> {
        let params = rest
            .car()
            .map_err(|_| Error::malformed("lambda without parameter list"))?;
        let body = rest.cdr()?;
        Ok(Value::Procedure(Procedure::interpreted(params, body)))
    }

    fn eval_loop(&mut self, body: &Value) -> Flow<Value> {
        if body.is_nil() {
            return Err(Error::malformed("loop with empty body").into());
        }
        loop {
            match self.eval_sequence(body) {
                Ok(_) => continue,
                Err(Signal::Break(value)) => return Ok(value),
                Err(err) => return Err(err),
            }
        }
    }

    /// Records `form` on an unwinding error when stack traces are enabled
    pub(crate) fn traced(&self, err: Error, form: &Value) -> Error {
        let config = self.engine.config();
        if !config.stack_trace {
            return err;
        }
        let printed = printer::print_limited(form, self.engine.interner(), config.trace_form_width);
        err.with_frame(printed)
    }

    /// Breaks pass through untouched
    fn trace(&self, signal: Signal, form: &Value) -> Signal {
        match signal {
            Signal::Error(err) => Signal::Error(self.traced(err, form)),
            other => other,
        }
    }
}

/// Exactly `count` arguments of a special form
fn form_args(rest: &Value, name: &str, count: usize) -> Result<Vec<Value>> {
    let args = rest
        .to_vec()
        .map_err(|_| Error::malformed(format!("{}: improper form", name)))?;
    if args.len() != count {
        return Err(Error::malformed(format!(
            "{}: expected {} operands, got {}",
            name,
            count,
            args.len()
        )));
    }
    Ok(args)
}

/// Binds an argument list against an atom, proper or dotted parameter pattern
///
/// A proper pattern requires an exact count; a dotted one only a minimum.
fn bind_params(frame: &Env, params: &Value, args: Value) -> Result<()> {
    let mut pattern = params.iter();
    let fixed = pattern.by_ref().count();
    let rest = pattern.rest();
    let got = args.iter().count();

    if got < fixed || (rest.is_nil() && got > fixed) {
        return Err(Error::ArityMismatch {
            expected: fixed,
            got,
        });
    }

    let mut remaining = args;
    for param in params.iter() {
        let name = param
            .as_atom()
            .map_err(|_| Error::malformed("parameter is not an atom"))?;
        frame.define(name, remaining.car()?);
        remaining = remaining.cdr()?;
    }

    match rest {
        Value::Nil => Ok(()),
        Value::Atom(name) => {
            frame.define(name, remaining);
            Ok(())
        }
        other => Err(Error::malformed(format!(
            "invalid rest parameter of type {}",
            other.type_name()
        ))),
    }
}
