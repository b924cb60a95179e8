//! JavaScript/TypeScript bindings for boa-exec
//!
//! Thin wrapper around `boa-exec-core` compiled to WebAssembly.
//! ZERO logic here — all behavior from the canonical Rust implementation.

use boa_exec_core::{ConsoleTarget, ExecConfig};
use wasm_bindgen::prelude::*;

fn config() -> ExecConfig {
    // there is no process stdout in a browser
    ExecConfig::default().with_console(ConsoleTarget::Silent)
}

/// Evaluate a script and return its completion value as text.
///
/// @param src - JavaScript source text
/// @returns The completion value in display form
/// @throws Error with "Uncaught <description>" if the script fails
#[wasm_bindgen]
pub fn evaluate(src: &str) -> Result<String, JsError> {
    boa_exec_core::execute(src, &config()).map_err(|e| JsError::new(&e.to_string()))
}

/// Evaluate a script and return text, never throwing for script failures.
///
/// @param src - JavaScript source text
/// @returns The completion value, or "Uncaught <description>"
#[wasm_bindgen]
pub fn exec(src: &str) -> String {
    boa_exec_core::fold_outcome(boa_exec_core::execute(src, &config()))
}

/// Largest accepted source, in bytes.
#[wasm_bindgen(js_name = "maxSourceLen")]
pub fn max_source_len() -> usize {
    config().max_source_len
}
