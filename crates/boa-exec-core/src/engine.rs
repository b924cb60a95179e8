//! Script engines
//!
//! [`ScriptEngine`] is the capability the boundary needs: evaluate a source
//! and hand back text, or say why not. [`BoaEngine`] provides it with the
//! Boa interpreter; anything else implementing the trait can stand in.
//!
//! # Result text
//!
//! A successful evaluation yields the completion value of the script in
//! the engine's display form. A script whose last statement produces no
//! value (a bare `console.log(..)` call, an empty source) yields
//! `undefined`. A module has no completion value; evaluating one yields
//! `undefined` once its evaluation promise settles as fulfilled.

use boa_engine::builtins::promise::PromiseState;
use boa_engine::module::Module;
use boa_engine::script::Script;
use boa_engine::{Context, JsError, JsNativeErrorKind, JsValue, Source};

use crate::config::{ExecConfig, SourceKind};
use crate::console::{self, ConsoleLine, ConsoleScope};
use crate::error::{ScriptError, ScriptErrorKind};
use crate::source::SourceText;
use crate::{Error, Result};

/// Something that can run a script and render its outcome as text
pub trait ScriptEngine {
    /// Short engine identifier, used in logs
    fn name(&self) -> &'static str;

    /// Largest source this engine accepts, in bytes
    fn max_source_len(&self) -> usize;

    /// Run `source` to completion and render the completion value.
    fn evaluate(&mut self, source: &SourceText<'_>) -> Result<String>;

    /// Console lines captured since the last call
    fn take_console(&mut self) -> Vec<ConsoleLine>;
}

/// [`ScriptEngine`] backed by a Boa [`Context`]
///
/// Each engine owns one context; globals defined by one evaluation are
/// visible to the next on the same engine. The boundary functions build a
/// fresh engine per call so nothing carries over between calls.
pub struct BoaEngine {
    context: Context,
    config: ExecConfig,
    console: Vec<ConsoleLine>,
}

impl BoaEngine {
    pub fn new(config: ExecConfig) -> Result<Self> {
        let mut context = Context::default();
        context.set_runtime_limits(config.runtime_limits());
        context.strict(config.strict);
        console::register(&mut context).map_err(|e| Error::Setup(e.to_string()))?;

        Ok(BoaEngine {
            context,
            config,
            console: Vec::new(),
        })
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    fn run(&mut self, source: &str) -> std::result::Result<String, ScriptError> {
        let value = match self.config.source_kind {
            SourceKind::Script => self.run_script(source)?,
            SourceKind::Module => self.run_module(source)?,
        };
        Ok(value.display().to_string())
    }

    fn run_script(&mut self, source: &str) -> std::result::Result<JsValue, ScriptError> {
        let script = Script::parse(Source::from_bytes(source), None, &mut self.context)
            .map_err(|e| ScriptError::new(ScriptErrorKind::Syntax, e.to_string()))?;

        let value = script
            .evaluate(&mut self.context)
            .map_err(|e| self.classify(e))?;

        if self.config.run_jobs {
            self.context.run_jobs();
        }
        Ok(value)
    }

    // Module evaluation is promise-driven, so the job queue is always drained.
    fn run_module(&mut self, source: &str) -> std::result::Result<JsValue, ScriptError> {
        let module = Module::parse(Source::from_bytes(source), None, &mut self.context)
            .map_err(|e| ScriptError::new(ScriptErrorKind::Syntax, e.to_string()))?;

        let promise = module.load_link_evaluate(&mut self.context);
        self.context.run_jobs();

        match promise.state() {
            PromiseState::Fulfilled(_) => Ok(JsValue::undefined()),
            PromiseState::Rejected(reason) => Err(self.classify(JsError::from_opaque(reason))),
            PromiseState::Pending => Err(ScriptError::new(
                ScriptErrorKind::Thrown,
                "module evaluation did not settle",
            )),
        }
    }

    fn classify(&mut self, err: JsError) -> ScriptError {
        let message = err.to_string();
        let kind = match err.try_native(&mut self.context) {
            Ok(native) if matches!(native.kind, JsNativeErrorKind::RuntimeLimit) => {
                ScriptErrorKind::RuntimeLimit
            }
            _ => ScriptErrorKind::Thrown,
        };
        ScriptError::new(kind, message)
    }
}

impl ScriptEngine for BoaEngine {
    fn name(&self) -> &'static str {
        "boa"
    }

    fn max_source_len(&self) -> usize {
        self.config.max_source_len
    }

    fn evaluate(&mut self, source: &SourceText<'_>) -> Result<String> {
        if source.len() > self.config.max_source_len {
            return Err(Error::SourceTooLarge {
                len: source.len(),
                limit: self.config.max_source_len,
            });
        }

        tracing::debug!(engine = self.name(), len = source.len(), "evaluating script");
        let scope = ConsoleScope::install(self.config.console);
        let outcome = self.run(source.as_str());
        self.console.extend(scope.take_lines());
        drop(scope);

        match outcome {
            Ok(text) => {
                tracing::debug!(engine = "boa", result_len = text.len(), "script completed");
                Ok(text)
            }
            Err(e) => {
                tracing::info!(engine = "boa", kind = %e.kind, "{}", e);
                Err(e.into())
            }
        }
    }

    fn take_console(&mut self) -> Vec<ConsoleLine> {
        std::mem::take(&mut self.console)
    }
}
