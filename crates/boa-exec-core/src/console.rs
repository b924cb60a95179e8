//! The `console` global
//!
//! Console output is a separate channel from the evaluation result: a
//! script like `console.log('hi')` writes `hi` here and completes with
//! `undefined`. Where the text goes is chosen per evaluation by
//! [`ConsoleTarget`].
//!
//! Native functions must be plain fn pointers, so the active target and any
//! captured lines live in a thread-local that a [`ConsoleScope`] installs for
//! the duration of one evaluation.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsResult, JsValue, NativeFunction};

/// Destination for console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleTarget {
    /// `log`/`info`/`debug`/`trace` to stdout, `warn`/`error`/`assert` to stderr
    #[default]
    Stdout,
    /// Keep lines in memory for the caller
    Capture,
    /// Drop everything
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Log,
    Info,
    Debug,
    Trace,
    Warn,
    Error,
}

impl ConsoleLevel {
    fn is_diagnostic(self) -> bool {
        matches!(self, ConsoleLevel::Warn | ConsoleLevel::Error)
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Trace => "trace",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// One call to a console method
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub message: String,
}

struct ConsoleState {
    target: ConsoleTarget,
    lines: Vec<ConsoleLine>,
}

thread_local! {
    static CONSOLE: RefCell<Option<ConsoleState>> = const { RefCell::new(None) };
}

/// Active console for the current thread; restores the previous one on drop.
pub(crate) struct ConsoleScope {
    previous: Option<ConsoleState>,
}

impl ConsoleScope {
    pub(crate) fn install(target: ConsoleTarget) -> Self {
        let state = ConsoleState {
            target,
            lines: Vec::new(),
        };
        let previous = CONSOLE.with(|c| c.borrow_mut().replace(state));
        ConsoleScope { previous }
    }

    /// Lines captured so far (always empty unless the target is `Capture`)
    pub(crate) fn take_lines(&self) -> Vec<ConsoleLine> {
        CONSOLE.with(|c| {
            c.borrow_mut()
                .as_mut()
                .map(|s| std::mem::take(&mut s.lines))
                .unwrap_or_default()
        })
    }
}

impl Drop for ConsoleScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CONSOLE.with(|c| *c.borrow_mut() = previous);
    }
}

fn emit(level: ConsoleLevel, message: String) {
    let target = CONSOLE.with(|c| {
        let mut c = c.borrow_mut();
        match c.as_mut() {
            Some(state) if state.target == ConsoleTarget::Capture => {
                state.lines.push(ConsoleLine {
                    level,
                    message: message.clone(),
                });
                ConsoleTarget::Capture
            }
            Some(state) => state.target,
            None => ConsoleTarget::Stdout,
        }
    });

    if target != ConsoleTarget::Stdout {
        return;
    }
    let written = if level.is_diagnostic() {
        writeln!(io::stderr().lock(), "{}", message)
    } else {
        writeln!(io::stdout().lock(), "{}", message)
    };
    if let Err(e) = written {
        tracing::debug!(%level, error = %e, "console write failed");
    }
}

/// Strings print raw; everything else uses the engine's display form.
fn render(args: &[JsValue]) -> String {
    args.iter()
        .map(|v| match v.as_string() {
            Some(s) => s.to_std_string_escaped(),
            None => v.display().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn log(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    emit(ConsoleLevel::Log, render(args));
    Ok(JsValue::undefined())
}

fn info(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    emit(ConsoleLevel::Info, render(args));
    Ok(JsValue::undefined())
}

fn debug(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    emit(ConsoleLevel::Debug, render(args));
    Ok(JsValue::undefined())
}

fn trace(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    emit(ConsoleLevel::Trace, render(args));
    Ok(JsValue::undefined())
}

fn warn(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    emit(ConsoleLevel::Warn, render(args));
    Ok(JsValue::undefined())
}

fn error(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    emit(ConsoleLevel::Error, render(args));
    Ok(JsValue::undefined())
}

// console.assert(condition, ...data)
fn assert(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    let holds = args.first().map(JsValue::to_boolean).unwrap_or(false);
    if !holds {
        let rest = args.get(1..).unwrap_or_default();
        let message = if rest.is_empty() {
            "Assertion failed".to_string()
        } else {
            format!("Assertion failed: {}", render(rest))
        };
        emit(ConsoleLevel::Error, message);
    }
    Ok(JsValue::undefined())
}

/// Install `console` on the global object of `context`.
pub(crate) fn register(context: &mut Context) -> JsResult<()> {
    let console = ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(log), js_string!("log"), 0)
        .function(NativeFunction::from_fn_ptr(info), js_string!("info"), 0)
        .function(NativeFunction::from_fn_ptr(debug), js_string!("debug"), 0)
        .function(NativeFunction::from_fn_ptr(trace), js_string!("trace"), 0)
        .function(NativeFunction::from_fn_ptr(warn), js_string!("warn"), 0)
        .function(NativeFunction::from_fn_ptr(error), js_string!("error"), 0)
        .function(NativeFunction::from_fn_ptr(assert), js_string!("assert"), 0)
        .build();

    context.register_global_property(
        js_string!("console"),
        console,
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    )
}
