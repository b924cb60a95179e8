//! C-FFI layer for boa-exec — used by C hosts and other FFI consumers.
//!
//! ZERO logic here. All calls delegate to `boa-exec-core`.
//!
//! # Memory Contract
//!
//! All functions that return `*mut c_char` allocate via `CString`.
//! The caller owns the returned string and MUST release it exactly once by
//! calling `boa_free_string()`. Releasing the same pointer twice, or reading
//! it after release, is undefined behavior. Rust callers should use
//! [`ExecutionResult`], which makes both mistakes impossible.
//!
//! # Configuration
//!
//! Each call reads `ExecConfig::from_env()`, so hosts tune limits through
//! `BOA_EXEC_CONFIG` / `BOA_EXEC_MAX_SOURCE_LEN` / `BOA_EXEC_LOOP_LIMIT` /
//! `BOA_EXEC_RECURSION_LIMIT` / `BOA_EXEC_STRICT`. Console output goes to
//! the process stdout and stderr unless the configuration silences it.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use boa_exec_core::{
    execute_bytes, fold_outcome, ConsoleTarget, Error, ExecConfig, Result, ScriptErrorKind,
};

mod owned;

pub use owned::ExecutionResult;

/// Failure category of a `boa_exec_checked()` call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoaErrorKind {
    /// No error; `result` is set.
    BoaOk = 0,
    /// The source did not parse.
    BoaSyntaxError = 1,
    /// The script threw.
    BoaThrown = 2,
    /// A loop, recursion or stack limit was hit.
    BoaRuntimeLimit = 3,
    /// Null, non-UTF-8, oversized or too deeply nested source; nothing was
    /// executed.
    BoaInvalidInput = 4,
    /// Configuration failure or an engine panic.
    BoaInternal = 5,
}

/// Result from `boa_exec_checked()`.
/// Exactly one of `result` and `error` is non-null.
/// The caller MUST free both with `boa_free_string()` (null is accepted),
/// or the whole struct with `boa_free_result()`.
#[repr(C)]
pub struct BoaResult {
    pub result: *mut c_char,
    pub error: *mut c_char,
    pub kind: BoaErrorKind,
}

impl BoaResult {
    fn ok(value: String) -> Self {
        BoaResult {
            result: into_c_string(value),
            error: ptr::null_mut(),
            kind: BoaErrorKind::BoaOk,
        }
    }

    fn err(kind: BoaErrorKind, msg: String) -> Self {
        BoaResult {
            result: ptr::null_mut(),
            error: into_c_string(msg),
            kind,
        }
    }

    fn from_error(e: Error) -> Self {
        let kind = match &e {
            Error::Script(s) => match s.kind {
                ScriptErrorKind::Syntax => BoaErrorKind::BoaSyntaxError,
                ScriptErrorKind::Thrown => BoaErrorKind::BoaThrown,
                ScriptErrorKind::RuntimeLimit => BoaErrorKind::BoaRuntimeLimit,
            },
            Error::SourceTooLarge { .. } | Error::NestingTooDeep { .. } | Error::InvalidUtf8(_) => {
                BoaErrorKind::BoaInvalidInput
            }
            Error::Io(_) | Error::Config(_) | Error::Setup(_) | Error::Panicked => {
                BoaErrorKind::BoaInternal
            }
        };
        let msg = match e {
            Error::Script(s) => s.message,
            other => other.to_string(),
        };
        BoaResult::err(kind, msg)
    }
}

/// Move `text` into a C string. Interior NULs become U+FFFD so the whole
/// text survives the boundary.
fn into_c_string(text: String) -> *mut c_char {
    let text = if text.contains('\0') {
        text.replace('\0', "\u{FFFD}")
    } else {
        text
    };
    CString::new(text)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

fn boundary_config() -> Result<ExecConfig> {
    let config = ExecConfig::from_env()?;
    // nobody on the C side can read captured lines
    if config.console == ConsoleTarget::Capture {
        return Ok(config.with_console(ConsoleTarget::Stdout));
    }
    Ok(config)
}

/// Run the core with panics contained; `None` means the engine panicked.
fn guarded(bytes: &[u8], config: Result<ExecConfig>) -> Option<Result<String>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        config.and_then(|config| execute_bytes(bytes, &config))
    }));
    match outcome {
        Ok(Err(Error::Panicked)) | Err(_) => {
            tracing::error!("engine panicked; returning no result");
            None
        }
        Ok(outcome) => Some(outcome),
    }
}

fn exec_text(bytes: &[u8], config: Result<ExecConfig>) -> *mut c_char {
    match guarded(bytes, config) {
        Some(outcome) => into_c_string(fold_outcome(outcome)),
        None => ptr::null_mut(),
    }
}

fn exec_checked(bytes: &[u8], config: Result<ExecConfig>) -> BoaResult {
    match guarded(bytes, config) {
        Some(Ok(text)) => BoaResult::ok(text),
        Some(Err(e)) => BoaResult::from_error(e),
        None => BoaResult::err(BoaErrorKind::BoaInternal, "engine panicked".into()),
    }
}

/// Execute a script and return its result as text.
///
/// Returns the completion value of the script (`undefined` when the last
/// statement produces none, including for an empty source), or
/// `Uncaught <description>` when the script fails to parse, throws, hits a
/// runtime limit, or is rejected as non-UTF-8, too deeply nested or longer
/// than `boa_max_source_len()` bytes.
///
/// Evaluation runs on a dedicated thread with a stack sized to the source,
/// and the call blocks until it finishes. Returns null only when `source`
/// is null or the engine panicked.
/// Output of `console.*` calls is written to stdout/stderr, not returned.
///
/// # Safety
/// `source` must be null or a valid null-terminated C string.
/// The caller must free a non-null result exactly once with `boa_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn boa_exec(source: *const c_char) -> *mut c_char {
    if source.is_null() {
        return ptr::null_mut();
    }
    exec_text(CStr::from_ptr(source).to_bytes(), boundary_config())
}

/// Execute a script, reporting success and failure separately.
///
/// # Safety
/// `source` must be null or a valid null-terminated C string.
/// The caller must free the returned strings with `boa_free_string()`
/// or `boa_free_result()`.
#[no_mangle]
pub unsafe extern "C" fn boa_exec_checked(source: *const c_char) -> BoaResult {
    if source.is_null() {
        return BoaResult::err(BoaErrorKind::BoaInvalidInput, "null source".into());
    }
    exec_checked(CStr::from_ptr(source).to_bytes(), boundary_config())
}

/// Largest source, in bytes, accepted by `boa_exec()` under the current
/// configuration. Returns 0 when the configuration does not load, since
/// every call then fails with a configuration error.
#[no_mangle]
pub extern "C" fn boa_max_source_len() -> usize {
    enforced_source_len(boundary_config())
}

fn enforced_source_len(config: Result<ExecConfig>) -> usize {
    config.map_or(0, |c| c.max_source_len)
}

/// Free a string previously returned by a boa-exec FFI function.
///
/// # Safety
/// `ptr` must be a pointer previously returned by a boa-exec FFI function
/// and not yet freed, or null (in which case this is a no-op).
/// Freeing twice or using `ptr` afterwards is undefined behavior.
#[no_mangle]
pub unsafe extern "C" fn boa_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Free both strings of a `BoaResult`.
///
/// # Safety
/// `result` must come from `boa_exec_checked()` and its strings must not
/// have been freed already.
#[no_mangle]
pub unsafe extern "C" fn boa_free_result(result: BoaResult) {
    boa_free_string(result.result);
    boa_free_string(result.error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_exec_core::DEFAULT_MAX_SOURCE_LEN;

    fn exec_str(src: &str) -> String {
        let src = CString::new(src).unwrap();
        unsafe {
            let ptr = boa_exec(src.as_ptr());
            assert!(!ptr.is_null());
            let text = CStr::from_ptr(ptr).to_str().unwrap().to_string();
            boa_free_string(ptr);
            text
        }
    }

    fn checked(bytes: &[u8]) -> (BoaErrorKind, Option<String>, Option<String>) {
        let src = CString::new(bytes).unwrap();
        read_result(unsafe { boa_exec_checked(src.as_ptr()) })
    }

    fn read_result(r: BoaResult) -> (BoaErrorKind, Option<String>, Option<String>) {
        let read = |p: *mut c_char| {
            (!p.is_null()).then(|| unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
        };
        let out = (r.kind, read(r.result), read(r.error));
        unsafe { boa_free_result(r) };
        out
    }

    #[test]
    fn test_exec_value() {
        assert_eq!(exec_str("1 + 2"), "3");
    }

    #[test]
    fn test_exec_call_without_value() {
        assert_eq!(
            exec_str("console.log('hello from C from Rust from JavaScript!');"),
            "undefined"
        );
    }

    #[test]
    fn test_exec_empty() {
        assert_eq!(exec_str(""), "undefined");
    }

    #[test]
    fn test_exec_null_source() {
        assert!(unsafe { boa_exec(ptr::null()) }.is_null());
    }

    #[test]
    fn test_exec_errors_folded() {
        assert!(exec_str("let = ;").starts_with("Uncaught SyntaxError"));
        assert!(exec_str("throw new RangeError('r')").starts_with("Uncaught RangeError"));
    }

    #[test]
    fn test_exec_oversized_folded() {
        let src = "1;".repeat(DEFAULT_MAX_SOURCE_LEN / 2 + 1);
        let text = exec_str(&src);
        assert!(text.starts_with("Uncaught source is"), "{}", text);
    }

    #[test]
    fn test_checked_kinds() {
        assert_eq!(
            checked(b"40 + 2"),
            (BoaErrorKind::BoaOk, Some("42".into()), None)
        );

        let (kind, result, error) = checked(b"(");
        assert_eq!(kind, BoaErrorKind::BoaSyntaxError);
        assert!(result.is_none());
        assert!(error.unwrap().starts_with("SyntaxError"));

        let (kind, _, error) = checked(b"throw 'oops'");
        assert_eq!(kind, BoaErrorKind::BoaThrown);
        assert!(error.unwrap().contains("oops"));

        let (kind, _, _) = checked(&[b'\'', 0xc3, 0x28, b'\'']);
        assert_eq!(kind, BoaErrorKind::BoaInvalidInput);
    }

    fn limited(loop_iteration_limit: u64) -> Result<ExecConfig> {
        let mut config = ExecConfig::default().with_console(ConsoleTarget::Silent);
        config.loop_iteration_limit = loop_iteration_limit;
        Ok(config)
    }

    #[test]
    fn test_checked_runtime_limit() {
        let (kind, result, error) = read_result(exec_checked(b"for (;;) {}", limited(100)));
        assert_eq!(kind, BoaErrorKind::BoaRuntimeLimit);
        assert!(result.is_none());
        assert!(error.is_some());

        let under_limit = b"let n = 0; for (let i = 0; i < 50; i++) n++; n";
        assert_eq!(
            read_result(exec_checked(under_limit, limited(100))),
            (BoaErrorKind::BoaOk, Some("50".into()), None)
        );
    }

    #[test]
    fn test_checked_bad_config_is_internal() {
        let config = ExecConfig::from_json_str("{ not json");
        let (kind, result, error) = read_result(exec_checked(b"1 + 1", config));
        assert_eq!(kind, BoaErrorKind::BoaInternal);
        assert!(result.is_none());
        assert!(error.unwrap().starts_with("configuration error"));
    }

    #[test]
    fn test_exec_bad_config_folded() {
        let ptr = exec_text(b"1 + 1", ExecConfig::from_json_str(r#"{"nope": 1}"#));
        assert!(!ptr.is_null());
        let text = unsafe { CString::from_raw(ptr) };
        assert!(text.to_str().unwrap().starts_with("Uncaught configuration error"));
    }

    #[test]
    fn test_checked_nesting_limit() {
        let mut config = ExecConfig::default().with_console(ConsoleTarget::Silent);
        config.max_nesting = 10;
        let src = "[".repeat(11) + &"]".repeat(11);
        let (kind, _, error) = read_result(exec_checked(src.as_bytes(), Ok(config)));
        assert_eq!(kind, BoaErrorKind::BoaInvalidInput);
        assert!(error.unwrap().contains("nests 11 levels"));
    }

    #[test]
    fn test_exec_deep_nesting() {
        let src = "[".repeat(2000) + &"]".repeat(2000);
        let text = exec_str(&src);
        assert!(text.starts_with('['), "{}", &text[..text.len().min(40)]);
    }

    #[test]
    fn test_enforced_source_len() {
        let config = ExecConfig::default().with_max_source_len(77);
        assert_eq!(enforced_source_len(Ok(config)), 77);
        assert_eq!(enforced_source_len(ExecConfig::from_json_str("{ not json")), 0);
    }

    #[test]
    fn test_checked_null_source() {
        let r = unsafe { boa_exec_checked(ptr::null()) };
        assert_eq!(r.kind, BoaErrorKind::BoaInvalidInput);
        assert!(r.result.is_null());
        assert!(!r.error.is_null());
        unsafe { boa_free_result(r) };
    }

    #[test]
    fn test_free_null_is_noop() {
        unsafe { boa_free_string(ptr::null_mut()) };
    }

    #[test]
    fn test_interior_nul_replaced() {
        let ptr = into_c_string("a\0b".to_string());
        let text = unsafe { CString::from_raw(ptr) };
        assert_eq!(text.to_str().unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_max_source_len_reported() {
        assert!(boa_max_source_len() > 0);
    }
}
