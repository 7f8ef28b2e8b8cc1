//! Macro-expansion pass
//!
//! Walks a freshly read tree once before evaluation. Special forms are
//! validated and their sub-forms expanded, derived forms (`let`, `cond`,
//! `(define (f . params) ...)`) are rewritten into core forms, and calls to
//! procedures flagged as macros in the root environment are replaced by the
//! macro's result. The output contains no macro calls, so compiling it
//! again returns an equal tree.

use crate::error::{Error, Result};
use crate::runtime::interner::{sym, Atom};
use crate::runtime::lisp_evaluator::LispEvaluator;
use crate::runtime::Value;

/// Compiler state: the evaluator used to run macro procedures
pub struct Compiler<'c, 'a> {
    ctx: &'c mut LispEvaluator<'a>,
}

impl<'c, 'a> Compiler<'c, 'a> {
    pub fn new(ctx: &'c mut LispEvaluator<'a>) -> Self {
        Compiler { ctx }
    }

    /// Fully expands `code`
    pub fn compile(&mut self, code: &Value) -> Result<Value> {
        match code {
            Value::Cell(_) => self
                .compile_form(code)
                .map_err(|err| self.ctx.traced(err, code)),
            other => Ok(other.clone()),
        }
    }

    /// Expands the head macro call of `code` once, leaving the result unexpanded
    ///
    /// Anything that is not a macro call is returned unchanged.
    pub fn expand_once(&mut self, code: &Value) -> Result<Value> {
        if let Value::Cell(_) = code {
            if let Value::Atom(head) = code.car()? {
                if let Some(mac) = self.lookup_macro(head) {
                    return self
                        .invoke_macro(&mac, code)
                        .map_err(|err| self.ctx.traced(err, code));
                }
            }
        }
        Ok(code.clone())
    }

    fn compile_form(&mut self, code: &Value) -> Result<Value> {
        let head = code.car()?;
        let rest = code.cdr()?;

        if let Value::Atom(atom) = head {
            match atom {
                sym::BEGIN | sym::LOOP => return Ok(Value::cons(head, self.compile_list(&rest)?)),
                sym::DEFINE => return self.compile_define(&rest),
                sym::SET => return self.compile_set(&rest),
                sym::IF => return self.compile_if(&rest),
                sym::LAMBDA => return self.compile_lambda(&rest),
                sym::QUOTE => return Ok(code.clone()),
                sym::LET => return self.compile_let(&rest),
                sym::COND => return self.compile_cond(&rest),
                _ => {}
            }

            if let Some(mac) = self.lookup_macro(atom) {
                let expanded = self.invoke_macro(&mac, code)?;
                return self.compile(&expanded);
            }
        }

        self.compile_list(code)
    }

    /// Expands every element of a proper list
    fn compile_list(&mut self, list: &Value) -> Result<Value> {
        let mut items = Vec::new();
        let mut iter = list.iter();
        for item in iter.by_ref() {
            items.push(self.compile(&item)?);
        }
        if !iter.rest().is_nil() {
            let printed = self.ctx.print(list);
            return Err(Error::malformed(format!("improper list in code: {}", printed)));
        }
        Ok(Value::list(items))
    }

    fn compile_define(&mut self, rest: &Value) -> Result<Value> {
        let target = rest
            .car()
            .map_err(|_| Error::malformed("define without a target"))?;
        let tail = rest.cdr()?;

        match &target {
            // (define (name . params) body ...)
            Value::Cell(_) => {
                let name = target
                    .car()?
                    .as_atom()
                    .map_err(|_| Error::malformed("define: procedure name must be an atom"))?;
                if tail.is_nil() {
                    return Err(Error::malformed("define: procedure without body"));
                }
                let lambda = Value::cons(
                    Value::Atom(sym::LAMBDA),
                    Value::cons(target.cdr()?, tail),
                );
                let named = Value::list(vec![
                    Value::Atom(sym::PROCEDURE_SET_NAME),
                    Value::list(vec![Value::Atom(sym::QUOTE), Value::Atom(name)]),
                    lambda,
                ]);
                let rewritten = Value::list(vec![Value::Atom(sym::DEFINE), Value::Atom(name), named]);
                self.compile(&rewritten)
            }
            Value::Atom(_) => {
                let args = tail
                    .to_vec()
                    .map_err(|_| Error::malformed("define: improper form"))?;
                if args.len() != 1 {
                    return Err(Error::malformed(format!(
                        "define: expected one value, got {}",
                        args.len()
                    )));
                }
                let value = self.compile(&args[0])?;
                Ok(Value::list(vec![Value::Atom(sym::DEFINE), target, value]))
            }
            other => Err(Error::malformed(format!(
                "define: cannot bind a {}",
                other.type_name()
            ))),
        }
    }

    fn compile_set(&mut self, rest: &Value) -> Result<Value> {
        let args = rest
            .to_vec()
            .map_err(|_| Error::malformed("set!: improper form"))?;
        if args.len() != 2 {
            return Err(Error::malformed("set!: expected a target and a value"));
        }
        if !matches!(args[0], Value::Atom(_)) {
            return Err(Error::malformed("set!: target must be an atom"));
        }
        let value = self.compile(&args[1])?;
        Ok(Value::list(vec![Value::Atom(sym::SET), args[0].clone(), value]))
    }

    fn compile_if(&mut self, rest: &Value) -> Result<Value> {
        let args = rest
            .to_vec()
            .map_err(|_| Error::malformed("if: improper form"))?;
        if args.len() < 2 {
            return Err(Error::malformed("if without then-branch"));
        }
        let mut out = vec![Value::Atom(sym::IF)];
        for arg in &args {
            out.push(self.compile(arg)?);
        }
        if args.len() == 2 {
            out.push(Value::UNDEF);
        }
        Ok(Value::list(out))
    }

    fn compile_lambda(&mut self, rest: &Value) -> Result<Value> {
        let params = rest
            .car()
            .map_err(|_| Error::malformed("lambda without parameter list"))?;
        validate_params(&params)?;
        let body = self.compile_list(&rest.cdr()?)?;
        Ok(Value::cons(Value::Atom(sym::LAMBDA), Value::cons(params, body)))
    }

    /// `(let ((name value) ...) body ...)` becomes `((lambda (name ...) body ...) value ...)`
    fn compile_let(&mut self, rest: &Value) -> Result<Value> {
        let bindings = rest
            .car()
            .map_err(|_| Error::malformed("let without bindings"))?;
        let body = rest.cdr()?;

        let mut names = Vec::new();
        let mut values = Vec::new();
        for binding in bindings
            .to_vec()
            .map_err(|_| Error::malformed("let: improper binding list"))?
        {
            let pair = binding
                .to_vec()
                .map_err(|_| Error::malformed("let: binding must be a list"))?;
            match pair.as_slice() {
                [Value::Atom(name), value] => {
                    names.push(Value::Atom(*name));
                    values.push(value.clone());
                }
                _ => return Err(Error::malformed("let: binding must be (name value)")),
            }
        }

        let lambda = Value::cons(
            Value::Atom(sym::LAMBDA),
            Value::cons(Value::list(names), body),
        );
        self.compile(&Value::cons(lambda, Value::list(values)))
    }

    /// `cond` becomes nested `if`s with `begin` bodies
    fn compile_cond(&mut self, rest: &Value) -> Result<Value> {
        let clauses = rest
            .to_vec()
            .map_err(|_| Error::malformed("cond: improper clause list"))?;

        let mut acc = Value::UNDEF;
        for (i, clause) in clauses.iter().enumerate().rev() {
            let test = clause
                .car()
                .map_err(|_| Error::malformed("cond: clause must be a list"))?;
            let body = clause.cdr()?;
            if body.is_nil() {
                return Err(Error::malformed("cond: clause without body"));
            }
            let seq = Value::cons(Value::Atom(sym::BEGIN), body);
            if test.is_atom(sym::ELSE) {
                if i + 1 != clauses.len() {
                    return Err(Error::malformed("cond: else must be the last clause"));
                }
                acc = seq;
            } else {
                acc = Value::list(vec![Value::Atom(sym::IF), test, seq, acc]);
            }
        }
        self.compile(&acc)
    }

    /// A procedure bound in the root environment and flagged as a macro
    fn lookup_macro(&mut self, name: Atom) -> Option<Value> {
        match self.ctx.engine().root().get(name) {
            Some(Value::Procedure(p)) if p.is_macro() => Some(Value::Procedure(p)),
            _ => None,
        }
    }

    /// Applies a macro to the unevaluated operands of `form`
    ///
    /// Callers attach `form` to the trace of a failure.
    fn invoke_macro(&mut self, mac: &Value, form: &Value) -> Result<Value> {
        if let Value::Procedure(p) = mac {
            tracing::debug!(name = %p.name(), "expanding macro");
        }
        let args = form.cdr()?;
        self.ctx.apply(mac, args).map_err(|signal| signal.into_error())
    }
}

/// Atom, `()`, proper list of atoms, or dotted list ending in an atom
fn validate_params(params: &Value) -> Result<()> {
    let mut iter = params.iter();
    for param in iter.by_ref() {
        if !matches!(param, Value::Atom(_)) {
            return Err(Error::malformed(format!(
                "lambda: parameter must be an atom, got {}",
                param.type_name()
            )));
        }
    }
    match iter.rest() {
        Value::Nil | Value::Atom(_) => Ok(()),
        other => Err(Error::malformed(format!(
            "lambda: invalid parameter pattern ending in {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::runtime::Engine;

    fn expand(source: &str) -> String {
        let mut engine = Engine::new();
        let forms = engine.read_all(source).unwrap();
        let mut last = String::new();
        for form in &forms {
            let expanded = engine.compile(form).unwrap();
            last = engine.print(&expanded);
        }
        last
    }

    fn expand_err(source: &str) -> Error {
        let mut engine = Engine::new();
        let form = engine.read_all(source).unwrap().remove(0);
        engine.compile(&form).unwrap_err()
    }

    #[test]
    fn test_core_forms_unchanged() {
        assert_eq!(expand("1"), "1");
        assert_eq!(expand("(if 1 2 3)"), "(if 1 2 3)");
        assert_eq!(expand("(define x 1)"), "(define x 1)");
        assert_eq!(expand("'(a (b))"), "(quote (a (b)))");
    }

    #[test]
    fn test_if_gets_undef_else() {
        assert_eq!(expand("(if 1 2)"), "(if 1 2 #undef)");
    }

    #[test]
    fn test_define_procedure_rewrite() {
        assert_eq!(
            expand("(define (f x) x)"),
            "(define f (procedure-set-name! (quote f) (lambda (x) x)))"
        );
        assert_eq!(
            expand("(define (g . xs) xs)"),
            "(define g (procedure-set-name! (quote g) (lambda xs xs)))"
        );
    }

    #[test]
    fn test_let_rewrite() {
        assert_eq!(
            expand("(let ((a 1) (b 2)) (+ a b))"),
            "((lambda (a b) (+ a b)) 1 2)"
        );
    }

    #[test]
    fn test_cond_rewrite() {
        assert_eq!(
            expand("(cond ((= x 1) 'one) (else 'other))"),
            "(if (= x 1) (begin (quote one)) (begin (quote other)))"
        );
        assert_eq!(
            expand("(cond (a 1))"),
            "(if a (begin 1) #undef)"
        );
    }

    #[test]
    fn test_malformed_forms() {
        assert!(matches!(expand_err("(define x)").kind(), Error::MalformedForm(_)));
        assert!(matches!(expand_err("(set! (a) 1)").kind(), Error::MalformedForm(_)));
        assert!(matches!(expand_err("(if 1)").kind(), Error::MalformedForm(_)));
        assert!(matches!(expand_err("(lambda (1) 1)").kind(), Error::MalformedForm(_)));
        assert!(matches!(expand_err("(f 1 . 2)").kind(), Error::MalformedForm(_)));
        assert!(matches!(expand_err("(cond (a))").kind(), Error::MalformedForm(_)));
    }

    #[test]
    fn test_quote_is_not_expanded() {
        assert_eq!(expand("(defmacro m (x) x) '(m 1)"), "(quote (m 1))");
    }

    #[test]
    fn test_macro_expansion() {
        assert_eq!(expand("(defmacro m (x) x) (m (+ 1 2))"), "(+ 1 2)");
    }

    #[test]
    fn test_macro_producing_macro_call() {
        let source = "
            (defmacro inner (x) (list 'quote x))
            (defmacro outer (x) (list 'inner x))
            (outer y)";
        assert_eq!(expand(source), "(quote y)");
    }

    #[test]
    fn test_compile_is_confluent() {
        let mut engine = Engine::new();
        engine.run("(defmacro twice (x) `(begin ,x ,x))").unwrap();
        let source = "(define (f a . rest) (cond ((null? rest) (twice a)) (else `(,a ,@rest))))";
        let form = engine.read_all(source).unwrap().remove(0);
        let once = engine.compile(&form).unwrap();
        let twice = engine.compile(&once).unwrap();
        assert_eq!(engine.print(&once), engine.print(&twice));
    }

    #[test]
    fn test_macro_error_traces_call_form() {
        let mut engine = Engine::new();
        engine.run("(defmacro bad (x) (car x))").unwrap();
        let form = engine.read_all("(bad 1)").unwrap().remove(0);
        let err = engine.compile(&form).unwrap_err();
        assert!(matches!(err.kind(), Error::TypeMismatch { .. }));
        assert_eq!(err.trace().last().map(String::as_str), Some("(bad 1)"));
    }

    #[test]
    fn test_malformed_form_traces_enclosing_forms() {
        let err = expand_err("(define (f) (if))");
        assert!(matches!(err.kind(), Error::MalformedForm(_)));
        assert_eq!(err.trace().first().map(String::as_str), Some("(if)"));
        assert_eq!(
            err.trace().last().map(String::as_str),
            Some("(define (f) (if))")
        );

        let err = expand_err("(begin 1 (set! (a) 1))");
        assert_eq!(
            err.trace(),
            ["(set! (a) 1)", "(begin 1 (set! (a) 1))"].map(String::from)
        );
    }

    #[test]
    fn test_compile_trace_respects_config() {
        let mut engine = Engine::with_config(crate::runtime::EngineConfig {
            stack_trace: false,
            ..Default::default()
        });
        let form = engine.read_all("(begin (if))").unwrap().remove(0);
        let err = engine.compile(&form).unwrap_err();
        assert!(matches!(err, Error::MalformedForm(_)));
    }
}
