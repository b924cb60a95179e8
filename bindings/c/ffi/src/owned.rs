//! Owned view of a `boa_exec()` result for Rust callers.

use std::ffi::CStr;
use std::fmt;
use std::ptr::NonNull;
use std::str::Utf8Error;

use crate::{boa_exec, boa_free_string};

/// A result string returned by `boa_exec()`, released exactly once on drop.
///
/// The pointer never escapes, so it cannot be freed twice or read after it
/// has been freed.
pub struct ExecutionResult {
    ptr: NonNull<std::os::raw::c_char>,
}

impl ExecutionResult {
    /// Run `source` through `boa_exec()`. `None` when the boundary returned
    /// null (the engine panicked).
    pub fn exec(source: &CStr) -> Option<Self> {
        // SAFETY: `source` is a valid null-terminated string for the whole call.
        let ptr = unsafe { boa_exec(source.as_ptr()) };
        NonNull::new(ptr).map(|ptr| ExecutionResult { ptr })
    }

    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: `ptr` came from `boa_exec()` and is only freed in `drop`.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    /// Raw result bytes, without the terminating NUL
    pub fn as_bytes(&self) -> &[u8] {
        self.as_c_str().to_bytes()
    }

    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        self.as_c_str().to_str()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl Drop for ExecutionResult {
    fn drop(&mut self) {
        // SAFETY: `ptr` is owned by this value and released only here.
        unsafe { boa_free_string(self.ptr.as_ptr()) }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_c_str().to_string_lossy())
    }
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExecutionResult")
            .field(&self.as_c_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_and_read() {
        let result = ExecutionResult::exec(c"[1, 2].length").unwrap();
        assert_eq!(result.to_str().unwrap(), "2");
        assert_eq!(result.as_bytes(), b"2");
        assert_eq!(result.to_string(), "2");
        assert!(!result.is_empty());
    }

    #[test]
    fn test_many_results_dropped() {
        let texts: Vec<String> = (0..10)
            .map(|i| {
                let src = std::ffi::CString::new(format!("{} * 2", i)).unwrap();
                ExecutionResult::exec(&src).unwrap().to_string()
            })
            .collect();
        assert_eq!(texts[9], "18");
    }

    #[test]
    fn test_error_text() {
        let result = ExecutionResult::exec(c"null.x").unwrap();
        assert!(result.to_str().unwrap().starts_with("Uncaught TypeError"));
    }
}
