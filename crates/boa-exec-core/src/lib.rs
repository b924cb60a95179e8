//! boa-exec core - run a script, get text back
//!
//! This crate is the single implementation of the execution boundary. The C
//! layer, the CLI and the language bindings all call into it.
//!
//! # Architecture
//!
//! ```text
//! source bytes → SourceText (size + UTF-8 checked)
//!                     ↓
//!               nesting check → evaluation thread (stack sized to the source)
//!                     ↓
//!               ScriptEngine::evaluate ──→ console channel (stdout / capture / silent)
//!                     ↓
//!               result text  |  Error::Script { Syntax | Thrown | RuntimeLimit }
//! ```
//!
//! # Guarantees
//!
//! - **Bounded**: sources over `ExecConfig::max_source_len` never reach the engine
//! - **Isolated**: [`execute`] builds a fresh engine per call; nothing is shared
//! - **Synchronous**: every call blocks until its evaluation thread is joined
//! - **No stack overflow**: nesting is bounded before parsing and the
//!   evaluation stack is sized for it
//! - **Two channels**: console output never mixes into the result text

pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod runner;
pub mod source;

pub use config::{ExecConfig, SourceKind};
pub use console::{ConsoleLevel, ConsoleLine, ConsoleTarget};
pub use engine::{BoaEngine, ScriptEngine};
pub use error::{Error, Result, ScriptError, ScriptErrorKind};
pub use runner::{run_isolated, Outcome};
pub use source::{
    read_bounded, BoundedReadError, SourceText, DEFAULT_MAX_NESTING, DEFAULT_MAX_SOURCE_LEN,
    STDIN_LIMIT,
};

/// Check `source` against the engine's bound and evaluate it on the calling
/// thread.
pub fn execute_on<E: ScriptEngine + ?Sized>(engine: &mut E, source: &str) -> Result<String> {
    let source = SourceText::new(source, engine.max_source_len())?;
    engine.evaluate(&source)
}

/// Evaluate `source` on a fresh Boa engine configured by `config`.
pub fn execute(source: &str, config: &ExecConfig) -> Result<String> {
    execute_with_console(source, config).result
}

/// Like [`execute`] for raw bytes; the size is checked before UTF-8.
pub fn execute_bytes(bytes: &[u8], config: &ExecConfig) -> Result<String> {
    let source = SourceText::from_bytes(bytes, config.max_source_len)?;
    run_isolated(&source, config).result
}

/// Like [`execute`], also returning console lines captured during the run.
pub fn execute_with_console(source: &str, config: &ExecConfig) -> Outcome {
    // size check before paying for a thread and a context
    match SourceText::new(source, config.max_source_len) {
        Ok(source) => run_isolated(&source, config),
        Err(e) => Outcome::failed(e),
    }
}

/// Collapse an outcome into the single-string convention of the C boundary:
/// the result text on success, `Uncaught <description>` on any failure.
pub fn fold_outcome(outcome: Result<String>) -> String {
    match outcome {
        Ok(text) => text,
        Err(Error::Script(e)) => e.to_string(),
        Err(e) => format!("Uncaught {}", e),
    }
}

/// Evaluate with the default configuration and fold the outcome to text.
pub fn exec(source: &str) -> String {
    fold_outcome(execute(source, &ExecConfig::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stand-in engine proving the boundary does not depend on Boa.
    struct UpperEngine {
        limit: usize,
        seen: Vec<String>,
    }

    impl ScriptEngine for UpperEngine {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn max_source_len(&self) -> usize {
            self.limit
        }

        fn evaluate(&mut self, source: &SourceText<'_>) -> Result<String> {
            self.seen.push(source.as_str().to_string());
            if source.as_str().contains("throw") {
                return Err(ScriptError::new(ScriptErrorKind::Thrown, "no").into());
            }
            Ok(source.as_str().to_uppercase())
        }

        fn take_console(&mut self) -> Vec<ConsoleLine> {
            Vec::new()
        }
    }

    fn quiet() -> ExecConfig {
        ExecConfig::default().with_console(ConsoleTarget::Silent)
    }

    #[test]
    fn test_execute_on_any_engine() {
        let mut engine = UpperEngine {
            limit: 8,
            seen: Vec::new(),
        };
        assert_eq!(execute_on(&mut engine, "abc").unwrap(), "ABC");
        assert!(execute_on(&mut engine, "too long for it").is_err());
        assert_eq!(engine.seen, vec!["abc"], "oversized source must not be evaluated");

        let dyn_engine: &mut dyn ScriptEngine = &mut engine;
        assert_eq!(
            fold_outcome(execute_on(dyn_engine, "throw")),
            "Uncaught no"
        );
    }

    #[test]
    fn test_execute_fresh_engine_per_call() {
        execute("var leaked = 1;", &quiet()).unwrap();
        let err = execute("leaked", &quiet()).unwrap_err();
        assert_eq!(err.as_script().map(|e| e.kind), Some(ScriptErrorKind::Thrown));
    }

    #[test]
    fn test_execute_rejects_oversized() {
        let config = quiet().with_max_source_len(3);
        let err = execute("1 + 1", &config).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_execute_bytes() {
        assert_eq!(execute_bytes(b"'a' + 'b'", &quiet()).unwrap(), "\"ab\"");
        let err = execute_bytes(&[b'\'', 0xff, b'\''], &quiet()).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8(_)));
        let err = execute_bytes(&[0xff; 8], &quiet().with_max_source_len(4)).unwrap_err();
        assert!(matches!(err, Error::SourceTooLarge { len: 8, limit: 4 }));
    }

    #[test]
    fn test_execute_with_console_captures() {
        let config = ExecConfig::default().with_console(ConsoleTarget::Capture);
        let outcome = execute_with_console("console.log('a', 1); 2", &config);
        assert_eq!(outcome.result.unwrap(), "2");
        assert_eq!(outcome.console[0].message, "a 1");

        let outcome = execute_with_console("1 + 1", &config.with_max_source_len(2));
        assert!(outcome.result.unwrap_err().is_input_error());
        assert!(outcome.console.is_empty());
    }

    #[test]
    fn test_execute_deep_nesting_does_not_overflow() {
        let src = "[".repeat(2000) + &"]".repeat(2000);
        assert!(execute(&src, &quiet()).unwrap().starts_with('['));
        let src = "!".repeat(3000) + "0";
        assert_eq!(execute(&src, &quiet()).unwrap(), "false");
    }

    #[test]
    fn test_exec_folds_errors() {
        assert_eq!(exec("6 * 7"), "42");
        assert!(exec("throw new Error('bad')").starts_with("Uncaught "));
        assert!(exec("(").starts_with("Uncaught SyntaxError"));
    }

    #[test]
    fn test_exec_empty() {
        assert_eq!(exec(""), "undefined");
    }

    #[test]
    fn test_fold_input_error() {
        let folded = fold_outcome(Err(Error::SourceTooLarge { len: 9, limit: 1 }));
        assert_eq!(folded, "Uncaught source is 9 bytes, the limit is 1 bytes");
    }

    #[test]
    fn test_determinism_100_iterations() {
        let src = "[1, 2, 3].map(x => x * 2).reduce((a, b) => a + b, 0)";
        let first = execute(src, &quiet()).unwrap();
        assert_eq!(first, "12");
        for i in 0..100 {
            let result = execute(src, &quiet()).unwrap();
            assert_eq!(first, result, "Non-determinism at iteration {}", i);
        }
    }
}
