//! Bounded script sources
//!
//! The execution boundary accepts sources up to a declared size. A
//! [`SourceText`] is a source that has already passed that check, so the
//! engine never sees an oversized or non-UTF-8 input.

use std::io::{self, Read};

use crate::{Error, Result};

/// Interface-level bound used when no configuration says otherwise (1 MiB)
pub const DEFAULT_MAX_SOURCE_LEN: usize = 1 << 20;

/// Bound used by the standard-input caller: inputs of this many bytes or
/// more are rejected before anything runs.
pub const STDIN_LIMIT: usize = 4096;

/// Nesting accepted by default; matches what the default evaluation stack holds
pub const DEFAULT_MAX_NESTING: usize = 8192;

/// A UTF-8 script source no longer than the limit it was checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceText<'a> {
    text: &'a str,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str, limit: usize) -> Result<Self> {
        if text.len() > limit {
            return Err(Error::SourceTooLarge {
                len: text.len(),
                limit,
            });
        }
        Ok(SourceText { text })
    }

    /// Check the size first, then UTF-8, so an oversized input is never decoded.
    pub fn from_bytes(bytes: &'a [u8], limit: usize) -> Result<Self> {
        if bytes.len() > limit {
            return Err(Error::SourceTooLarge {
                len: bytes.len(),
                limit,
            });
        }
        let text = std::str::from_utf8(bytes)?;
        Ok(SourceText { text })
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Deepest nesting of brackets plus runs of prefix operators, the shapes
    /// that make the parser recurse once per byte. The contents of string
    /// literals, templates and comments are skipped.
    pub fn nesting_depth(&self) -> usize {
        let bytes = self.text.as_bytes();
        let (mut depth, mut run, mut max) = (0usize, 0usize, 0usize);
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'(' | b'[' | b'{' => {
                    depth += 1;
                    run = 0;
                }
                b')' | b']' | b'}' => {
                    depth = depth.saturating_sub(1);
                    run = 0;
                }
                b'!' | b'~' | b'+' | b'-' => run += 1,
                b' ' | b'\t' | b'\n' | b'\r' => {}
                quote @ (b'\'' | b'"' | b'`') => {
                    i = skip_quoted(bytes, i + 1, quote);
                    run = 0;
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    i = skip_past(bytes, i + 2, b"\n");
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = skip_past(bytes, i + 2, b"*/");
                    continue;
                }
                _ => run = 0,
            }
            max = max.max(depth + run);
            i += 1;
        }
        max
    }
}

/// Index just past the closing `quote`, honoring backslash escapes.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_past(bytes: &[u8], from: usize, end: &[u8]) -> usize {
    bytes[from.min(bytes.len())..]
        .windows(end.len())
        .position(|w| w == end)
        .map_or(bytes.len(), |p| from + p + end.len())
}

/// Why a bounded read produced no source
#[derive(Debug, thiserror::Error)]
pub enum BoundedReadError {
    #[error("{0}")]
    Io(#[from] io::Error),
    /// The input reached the limit; it was not kept.
    #[error("input is {limit} bytes or longer")]
    Oversized { limit: usize },
}

/// Read a whole input that must stay strictly below `limit` bytes.
///
/// At most `limit` bytes are consumed from `reader`. If that many arrive the
/// input is rejected, so `limit - 1` is the largest accepted size.
pub fn read_bounded<R: Read>(reader: R, limit: usize) -> std::result::Result<Vec<u8>, BoundedReadError> {
    let mut buf = Vec::with_capacity(limit.min(STDIN_LIMIT));
    reader.take(limit as u64).read_to_end(&mut buf)?;
    if buf.len() >= limit {
        return Err(BoundedReadError::Oversized { limit });
    }
    Ok(buf)
}
