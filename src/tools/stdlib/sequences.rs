//! Pair and list natives

use crate::error::{Error, Result};
use crate::runtime::{CellRef, LispEvaluator, Value};
use crate::tools::Registry;

/// Register all list natives
pub fn register(registry: &mut Registry<'_>) {
    registry.function("cons", cons);
    registry.function("car", car);
    registry.function("cdr", cdr);
    registry.function("set-car!", set_car);
    registry.function("set-cdr!", set_cdr);
    registry.variadic("list", list);
    registry.variadic("append", append);
    registry.function("reverse", reverse);
    registry.function("length", length);
}

fn cons(_ctx: &mut LispEvaluator<'_>, car: Value, cdr: Value) -> Result<Value> {
    Ok(Value::cons(car, cdr))
}

fn car(_ctx: &mut LispEvaluator<'_>, cell: CellRef) -> Result<Value> {
    let car = cell.borrow().car.clone();
    Ok(car)
}

fn cdr(_ctx: &mut LispEvaluator<'_>, cell: CellRef) -> Result<Value> {
    let cdr = cell.borrow().cdr.clone();
    Ok(cdr)
}

/// SET-CAR! - Returns the stored value
fn set_car(_ctx: &mut LispEvaluator<'_>, cell: CellRef, value: Value) -> Result<Value> {
    cell.borrow_mut().car = value.clone();
    Ok(value)
}

/// SET-CDR! - Returns the stored value; may build cycles
fn set_cdr(_ctx: &mut LispEvaluator<'_>, cell: CellRef, value: Value) -> Result<Value> {
    cell.borrow_mut().cdr = value.clone();
    Ok(value)
}

/// LIST - The evaluated argument list is already a fresh list
fn list(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
    Ok(args)
}

/// APPEND - Copies every argument but the last, which becomes the shared tail
///
/// The last argument may be any value, so `(append '(1) 2)` is `(1 . 2)`.
fn append(_ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
    let mut lists = args.to_vec()?;
    let tail = match lists.pop() {
        Some(last) => last,
        None => return Ok(Value::Nil),
    };
    let mut items = Vec::new();
    for list in &lists {
        items.extend(list.to_vec()?);
    }
    Ok(Value::list_with_tail(items, tail))
}

fn reverse(_ctx: &mut LispEvaluator<'_>, list: Value) -> Result<Value> {
    let items = list.to_vec()?;
    Ok(items
        .into_iter()
        .fold(Value::Nil, |acc, item| Value::cons(item, acc)))
}

fn length(_ctx: &mut LispEvaluator<'_>, list: Value) -> Result<i64> {
    match list {
        Value::Nil | Value::Cell(_) => Ok(list.to_vec()?.len() as i64),
        other => Err(Error::type_mismatch("list", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::runtime::{Engine, Value};

    fn eval(source: &str) -> String {
        let mut engine = Engine::new();
        let value = engine.run(source).unwrap();
        engine.print(&value)
    }

    fn eval_err(source: &str) -> Error {
        let mut engine = Engine::new();
        engine.run(source).unwrap_err()
    }

    #[test]
    fn test_cons_car_cdr() {
        assert_eq!(eval("(cons 1 2)"), "(1 . 2)");
        assert_eq!(eval("(cons 1 '())"), "(1)");
        assert_eq!(eval("(car '(1 2))"), "1");
        assert_eq!(eval("(cdr '(1 2))"), "(2)");
    }

    #[test]
    fn test_car_of_non_cell() {
        match eval_err("(car 5)").kind() {
            Error::TypeMismatch { expected, got } => {
                assert_eq!(expected, "cell");
                assert_eq!(got, "number");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
        assert!(matches!(eval_err("(cdr '())").kind(), Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_mutation() {
        assert_eq!(eval("(define p (cons 1 2)) (set-car! p 3) p"), "(3 . 2)");
        assert_eq!(eval("(define p (list 1 2)) (set-cdr! p '(9)) p"), "(1 9)");
    }

    #[test]
    fn test_cycle_via_set_cdr() {
        let mut engine = Engine::new();
        let value = engine
            .run("(define p (list 1 2)) (set-cdr! (cdr p) p) p")
            .unwrap();
        assert_eq!(engine.print(&value), "(1 2 ...)");
    }

    #[test]
    fn test_cyclic_list_operations_terminate() {
        let mut engine = Engine::new();
        engine
            .run("(define p (list 1 2)) (set-cdr! (cdr p) p) (define q (list 1 2)) (set-cdr! (cdr q) q)")
            .unwrap();
        let err = engine.run("(length p)").unwrap_err();
        assert!(matches!(err.kind(), Error::TypeMismatch { .. }));
        assert_eq!(engine.run("(equal? p q)").unwrap(), Value::TRUE);
        assert_eq!(engine.run("(equal? p '(1 2))").unwrap(), Value::FALSE);
    }

    #[test]
    fn test_list() {
        assert_eq!(eval("(list 1 2)"), "(1 2)");
        assert_eq!(eval("(list)"), "()");
    }

    #[test]
    fn test_append_copies_all_but_last() {
        assert_eq!(eval("(append '(1 2) '(3) '() '(4))"), "(1 2 3 4)");
        assert_eq!(eval("(append '(1) 2)"), "(1 . 2)");
        assert_eq!(eval("(append)"), "()");
        assert_eq!(
            eval("(define a '(1)) (define b (append a '(2))) (set-car! b 9) a"),
            "(1)"
        );
    }

    #[test]
    fn test_append_shares_last() {
        assert_eq!(eval("(define t '(2)) (eq? (cdr (append '(1) t)) t)"), "#t");
    }

    #[test]
    fn test_reverse_and_length() {
        assert_eq!(eval("(reverse '(1 2 3))"), "(3 2 1)");
        assert_eq!(eval("(reverse '())"), "()");
        assert_eq!(eval("(length '(1 2 3))"), "3");
        assert_eq!(eval("(length '())"), "0");
        assert!(matches!(eval_err("(length '(1 . 2))").kind(), Error::TypeMismatch { .. }));
    }
}
