//! Output and file loading natives
//!
//! `puts`, `display` and `write` print to stdout and return `()`.

use std::io::Write;

use crate::error::{Error, Result};
use crate::runtime::{LispEvaluator, Value};
use crate::tools::Registry;

/// Register all I/O natives
pub fn register(registry: &mut Registry<'_>) {
    registry.variadic("puts", puts);
    registry.variadic("display", display);
    registry.variadic("write", write);
    registry.function("load", load);
}

/// PUTS - Printed forms separated by spaces, then a newline
fn puts(ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
    let mut line = render_puts(ctx, &args);
    line.push('\n');
    emit(&line)
}

/// DISPLAY - Strings raw, everything else in printed form
fn display(ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
    let text = render_display(ctx, &args);
    emit(&text)
}

/// WRITE - Printed forms, concatenated
fn write(ctx: &mut LispEvaluator<'_>, args: Value) -> Result<Value> {
    let text: String = args.iter().map(|v| ctx.print(&v)).collect();
    emit(&text)
}

/// LOAD - Runs a source file in this engine; yields its last value
fn load(ctx: &mut LispEvaluator<'_>, path: String) -> Result<Value> {
    ctx.engine().load(&path)
}

fn render_puts(ctx: &LispEvaluator<'_>, args: &Value) -> String {
    args.iter()
        .map(|v| ctx.print(&v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_display(ctx: &LispEvaluator<'_>, args: &Value) -> String {
    args.iter()
        .map(|v| match &v {
            Value::String(s) => s.to_string(),
            other => ctx.print(other),
        })
        .collect()
}

fn emit(text: &str) -> Result<Value> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| Error::Io {
            path: "<stdout>".to_string(),
            message: e.to_string(),
        })?;
    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Engine;

    fn args(engine: &mut Engine, source: &str) -> Value {
        engine.run(source).unwrap()
    }

    #[test]
    fn test_render_puts() {
        let mut engine = Engine::new();
        let list = args(&mut engine, "(list \"a\" 1 'b)");
        let ctx = LispEvaluator::new(&mut engine);
        assert_eq!(render_puts(&ctx, &list), "\"a\" 1 b");
    }

    #[test]
    fn test_render_display() {
        let mut engine = Engine::new();
        let list = args(&mut engine, "(list \"a\" 1 '(\"b\"))");
        let ctx = LispEvaluator::new(&mut engine);
        assert_eq!(render_display(&ctx, &list), "a1(\"b\")");
    }

    #[test]
    fn test_output_natives_return_nil() {
        let mut engine = Engine::new();
        assert_eq!(engine.run("(write 1)").unwrap(), Value::Nil);
        assert_eq!(engine.run("(display \"\")").unwrap(), Value::Nil);
        assert_eq!(engine.run("(puts)").unwrap(), Value::Nil);
    }

    #[test]
    fn test_load_native() {
        let path = std::env::temp_dir().join(format!("lispcore-io-{}.lisp", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "(define loaded 'yes) 40").unwrap();
        }
        let mut engine = Engine::new();
        let source = format!("(+ 2 (load \"{}\"))", path.display());
        let result = engine.run(&source).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(result, Value::Number(42));
        let loaded = engine.lookup_global("loaded").unwrap();
        assert_eq!(engine.print(&loaded), "yes");
    }

    #[test]
    fn test_load_missing() {
        let mut engine = Engine::new();
        let err = engine.run("(load \"/nonexistent/lispcore.lisp\")").unwrap_err();
        assert!(matches!(err.kind(), Error::Io { .. }));
    }
}
