//! Python bindings for boa-exec
//!
//! Thin wrapper around `boa-exec-core` — ZERO logic here.
//! All behavior comes from the canonical Rust implementation.

use boa_exec_core::{Error, ExecConfig, ScriptErrorKind};
use pyo3::exceptions::{PyRuntimeError, PySyntaxError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(e: Error) -> PyErr {
    match e {
        Error::Script(s) => match s.kind {
            ScriptErrorKind::Syntax => PySyntaxError::new_err(s.message),
            ScriptErrorKind::Thrown | ScriptErrorKind::RuntimeLimit => {
                PyRuntimeError::new_err(s.message)
            }
        },
        Error::SourceTooLarge { .. } | Error::NestingTooDeep { .. } | Error::InvalidUtf8(_) => {
            PyValueError::new_err(e.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

fn config() -> PyResult<ExecConfig> {
    ExecConfig::from_env().map_err(to_py_err)
}

/// Evaluate a script and return its completion value as text.
///
/// Args:
///     source: JavaScript source text
///
/// Returns:
///     The completion value in display form ("undefined" when the last
///     statement produces no value). console.* output goes to stdout/stderr.
///
/// Raises:
///     SyntaxError: If the source does not parse
///     RuntimeError: If the script throws or hits a runtime limit
///     ValueError: If the source is longer or nests deeper than the
///         configured limits
#[pyfunction]
fn evaluate(py: Python<'_>, source: &str) -> PyResult<String> {
    let config = config()?;
    py.allow_threads(|| boa_exec_core::execute(source, &config))
        .map_err(to_py_err)
}

/// Evaluate a script and return text, never raising for script failures.
///
/// Args:
///     source: JavaScript source text
///
/// Returns:
///     The completion value, or "Uncaught <description>" on failure
#[pyfunction]
fn exec(py: Python<'_>, source: &str) -> PyResult<String> {
    let config = config()?;
    let outcome = py.allow_threads(|| boa_exec_core::execute(source, &config));
    Ok(boa_exec_core::fold_outcome(outcome))
}

/// Largest source, in bytes, that evaluate() and exec() accept under the
/// current configuration.
///
/// Raises:
///     RuntimeError: If the configuration does not load
#[pyfunction]
fn max_source_len() -> PyResult<usize> {
    Ok(config()?.max_source_len)
}

/// boa-exec Python module — run JavaScript, get text back
#[pymodule]
fn boaexec(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(exec, m)?)?;
    m.add_function(wrap_pyfunction!(max_source_len, m)?)?;
    Ok(())
}
