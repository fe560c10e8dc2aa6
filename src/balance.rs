//! Balanced-delimiter extraction over TypeScript/TSX source text.
//!
//! Flat regex deletion of nested code blocks is unsafe: a `)` inside a string
//! literal or a comment must not close an expression. This module is the one
//! reusable primitive the text rules lean on instead: a single left-to-right
//! scan that tracks nesting depth for the opening delimiter kind, string and
//! template-literal state (including `${...}` interpolations, which may
//! themselves contain templates), and line/block comment state.
//!
//! Extraction either succeeds with a valid [`DelimiterSpan`] or fails with an
//! explicit error. It never returns a best-guess partial span.

use crate::error::{CodemodError, Result};

/// A half-open byte range `[start, end)` covering one balanced expression,
/// from its opening delimiter through its matching closing delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterSpan {
    pub start: usize,
    pub end: usize,
    pub open: char,
    pub close: char,
}

impl DelimiterSpan {
    /// The spanned source text, including both delimiters.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Finds the balanced expression attached to `anchor` (typically the offset
/// just past an `=` or `=>`). Leading ASCII whitespace is skipped; the next
/// byte must be `(`, `[`, or `{`.
pub fn extract_balanced(source: &str, anchor: usize) -> Result<DelimiterSpan> {
    let bytes = source.as_bytes();
    let mut i = anchor;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    let (open, close) = match bytes.get(i) {
        Some(b'(') => (b'(', b')'),
        Some(b'[') => (b'[', b']'),
        Some(b'{') => (b'{', b'}'),
        _ => return Err(CodemodError::NoDelimiter { offset: anchor }),
    };

    let close_at = scan_to_close(bytes, i + 1, open, close, i)?;
    Ok(DelimiterSpan {
        start: i,
        end: close_at + 1,
        open: open as char,
        close: close as char,
    })
}

/// Finds the byte offset just past the `;` that terminates the statement
/// beginning at `from`, skipping over balanced groups, strings, templates,
/// and comments on the way. Used to take out a whole assignment such as
/// `Foo.getLayout = (page) => ( ... );` in one span.
pub fn statement_end(source: &str, from: usize) -> Result<usize> {
    let bytes = source.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        match bytes[i] {
            b';' => return Ok(i + 1),
            b'(' | b'[' | b'{' => {
                let span = extract_balanced(source, i)?;
                i = span.end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'\'' | b'"' => i = skip_string(bytes, i),
            b'`' => i = skip_template(bytes, i)?,
            _ => i += 1,
        }
    }

    Err(CodemodError::Unbalanced { offset: from })
}

/// Scans from just past an opening delimiter to its matching close.
/// Returns the index of the closing byte.
fn scan_to_close(
    bytes: &[u8],
    start: usize,
    open: u8,
    close: u8,
    opened_at: usize,
) -> Result<usize> {
    let mut depth = 1usize;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            i = skip_line_comment(bytes, i);
        } else if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i = skip_block_comment(bytes, i);
        } else if b == b'\'' || b == b'"' {
            i = skip_string(bytes, i);
        } else if b == b'`' {
            i = skip_template(bytes, i)?;
        } else if b == open {
            depth += 1;
            i += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Ok(i);
            }
            i += 1;
        } else {
            i += 1;
        }
    }

    Err(CodemodError::Unbalanced { offset: opened_at })
}

/// `i` is at the first `/`. Returns the index of the terminating newline
/// (kept, so line accounting stays intact) or end of input.
fn skip_line_comment(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// `i` is at the `/` of `/*`. Returns the index just past the closing `*/`,
/// or end of input for an unterminated comment.
fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    i += 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// `i` is at the opening quote. Returns the index just past the closing
/// quote. An unescaped newline terminates the literal so that a stray quote
/// cannot swallow the rest of the file.
fn skip_string(bytes: &[u8], i: usize) -> usize {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => return j,
            b if b == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// `i` is at the opening backtick. Returns the index just past the closing
/// backtick. `${...}` interpolations are delegated back to the balanced
/// scanner, so nested templates and braces inside interpolations are handled
/// by recursion rather than flat counting.
fn skip_template(bytes: &[u8], i: usize) -> Result<usize> {
    let opened_at = i;
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'`' => return Ok(j + 1),
            b'$' if bytes.get(j + 1) == Some(&b'{') => {
                let close = scan_to_close(bytes, j + 2, b'{', b'}', j + 1)?;
                j = close + 1;
            }
            _ => j += 1,
        }
    }
    Err(CodemodError::Unbalanced { offset: opened_at })
}
