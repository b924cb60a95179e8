//! Isolated evaluation
//!
//! Parsing, compiling, rendering and dropping a script all recurse with the
//! nesting of the source, so a short but deeply nested input can exhaust a
//! native stack. [`run_isolated`] builds a fresh engine on a dedicated
//! thread whose stack grows with the source length, up to
//! `ExecConfig::thread_stack_size`, and joins it. Nesting deeper than that
//! stack holds is rejected before anything is parsed.

use crate::config::ExecConfig;
use crate::console::ConsoleLine;
use crate::engine::{BoaEngine, ScriptEngine};
use crate::source::SourceText;
use crate::{Error, Result};

/// Default cap on the evaluation stack. Address space only; pages are
/// committed as the parser touches them.
pub const DEFAULT_THREAD_STACK_SIZE: usize = 1 << 30;

const STACK_BASE: usize = 64 << 20;
// one nesting level per source byte at worst
const STACK_PER_BYTE: usize = 128 << 10;

/// Native stack reserved for a source of `len` bytes.
pub fn stack_size_for(len: usize, cap: usize) -> usize {
    STACK_BASE
        .saturating_add(len.saturating_mul(STACK_PER_BYTE))
        .min(cap)
}

/// Everything one evaluation produced
#[derive(Debug)]
pub struct Outcome {
    pub result: Result<String>,
    /// Lines recorded when the console target is `capture`
    pub console: Vec<ConsoleLine>,
}

impl Outcome {
    pub(crate) fn failed(err: Error) -> Self {
        Outcome {
            result: Err(err),
            console: Vec::new(),
        }
    }
}

/// Evaluate `source` on a fresh engine running on its own thread.
pub fn run_isolated(source: &SourceText<'_>, config: &ExecConfig) -> Outcome {
    let depth = source.nesting_depth();
    if depth > config.max_nesting {
        tracing::info!(depth, limit = config.max_nesting, "source rejected before parsing");
        return Outcome::failed(Error::NestingTooDeep {
            depth,
            limit: config.max_nesting,
        });
    }

    let evaluate = move || evaluate_fresh(source, config);

    // no threads on wasm32-unknown-unknown
    if cfg!(target_family = "wasm") {
        return evaluate();
    }

    let stack = stack_size_for(source.len(), config.thread_stack_size);
    tracing::debug!(stack, depth, "starting evaluation thread");
    std::thread::scope(|scope| {
        let handle = match std::thread::Builder::new()
            .name("boa-exec-eval".into())
            .stack_size(stack)
            .spawn_scoped(scope, evaluate)
        {
            Ok(handle) => handle,
            Err(e) => {
                return Outcome::failed(Error::Setup(format!(
                    "cannot start evaluation thread: {}",
                    e
                )))
            }
        };
        handle.join().unwrap_or_else(|_| {
            tracing::error!("evaluation thread panicked");
            Outcome::failed(Error::Panicked)
        })
    })
}

fn evaluate_fresh(source: &SourceText<'_>, config: &ExecConfig) -> Outcome {
    let mut engine = match BoaEngine::new(config.clone()) {
        Ok(engine) => engine,
        Err(e) => return Outcome::failed(e),
    };
    let result = engine.evaluate(source);
    Outcome {
        result,
        console: engine.take_console(),
    }
}
