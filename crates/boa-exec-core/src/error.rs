//! Error types for boa-exec
//!
//! All fallible operations return `Result<T, Error>`.
//! Engine failures are carried as [`ScriptError`] so callers can tell a
//! syntax error from a thrown value without parsing text.

use std::fmt;
use std::io;
use std::str::Utf8Error;

/// How a script failed inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptErrorKind {
    /// The source did not parse
    Syntax,
    /// The script threw (a native error or any other value)
    Thrown,
    /// A loop, recursion or stack limit was hit
    RuntimeLimit,
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptErrorKind::Syntax => write!(f, "syntax error"),
            ScriptErrorKind::Thrown => write!(f, "uncaught exception"),
            ScriptErrorKind::RuntimeLimit => write!(f, "runtime limit exceeded"),
        }
    }
}

/// A failure reported by the script engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Uncaught {message}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    /// Engine rendering of the error, e.g. `TypeError: x is not a function`
    pub message: String,
}

impl ScriptError {
    pub fn new(kind: ScriptErrorKind, message: impl Into<String>) -> Self {
        ScriptError {
            kind,
            message: message.into(),
        }
    }
}

/// boa-exec error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source is longer than the interface accepts
    #[error("source is {len} bytes, the limit is {limit} bytes")]
    SourceTooLarge { len: usize, limit: usize },

    /// Brackets or prefix operators nest deeper than the evaluation stack holds
    #[error("source nests {depth} levels deep, the limit is {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    /// Source bytes are not UTF-8
    #[error("source is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    /// Reading a source failed
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// The engine context could not be prepared
    #[error("engine setup failed: {0}")]
    Setup(String),

    /// The evaluation thread panicked
    #[error("engine panicked")]
    Panicked,

    /// The engine rejected or threw
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl Error {
    /// The engine-side failure, if this is one
    pub fn as_script(&self) -> Option<&ScriptError> {
        match self {
            Error::Script(e) => Some(e),
            _ => None,
        }
    }

    /// True for failures caused by the input rather than by running it
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::SourceTooLarge { .. } | Error::NestingTooDeep { .. } | Error::InvalidUtf8(_)
        )
    }
}

/// Result type alias for boa-exec operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_error_display_is_uncaught() {
        let err = ScriptError::new(ScriptErrorKind::Thrown, "TypeError: nope");
        assert_eq!(err.to_string(), "Uncaught TypeError: nope");
        assert_eq!(Error::from(err).to_string(), "Uncaught TypeError: nope");
    }

    #[test]
    fn test_input_errors() {
        let too_large = Error::SourceTooLarge { len: 10, limit: 4 };
        assert!(too_large.is_input_error());
        assert!(too_large.as_script().is_none());
        assert_eq!(
            too_large.to_string(),
            "source is 10 bytes, the limit is 4 bytes"
        );

        let deep = Error::NestingTooDeep { depth: 9000, limit: 8192 };
        assert!(deep.is_input_error());
        assert_eq!(deep.to_string(), "source nests 9000 levels deep, the limit is 8192");

        let io = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(!io.is_input_error());
        assert!(!Error::Panicked.is_input_error());
    }
}
