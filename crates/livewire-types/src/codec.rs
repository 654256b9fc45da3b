//! Newline-delimited JSON framing.
//!
//! [`LineBuffer`] accumulates raw bytes from a stream and yields complete
//! lines. Several messages may arrive in a single read and a message may be
//! split across reads; the buffer handles both. Lines are trimmed and empty
//! lines are skipped so callers only see candidate payloads.

use std::collections::VecDeque;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Maximum size of a single pending line in bytes.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Errors raised while framing or parsing messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A line could not be parsed as the expected JSON shape.
    #[error("malformed JSONL: {0}")]
    Malformed(#[source] serde_json::Error),
    /// Serialising an outgoing message failed.
    #[error("failed to serialise message: {0}")]
    Serialise(#[source] serde_json::Error),
    /// The peer sent more than [`MAX_LINE_BYTES`] without a newline.
    #[error("line exceeds {max} byte limit ({size} bytes pending)")]
    LineTooLong { size: usize, max: usize },
}

/// Per-connection accumulation buffer.
#[derive(Debug)]
pub struct LineBuffer {
    pending: VecDeque<u8>,
    limit: Option<usize>,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            limit: Some(MAX_LINE_BYTES),
        }
    }
}

impl LineBuffer {
    /// Creates an empty buffer capped at [`MAX_LINE_BYTES`] per line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with no line cap, for reading responses whose
    /// size is decided by the host.
    pub fn unbounded() -> Self {
        Self {
            pending: VecDeque::new(),
            limit: None,
        }
    }

    /// Appends bytes read from the stream.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::LineTooLong`] when the bytes after the last
    /// newline exceed the cap. The buffer is cleared in that case because its
    /// contents can no longer be framed reliably.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.pending.extend(bytes);
        let Some(max) = self.limit else {
            return Ok(());
        };
        let tail = match self.pending.iter().rposition(|byte| *byte == b'\n') {
            Some(pos) => self.pending.len() - pos - 1,
            None => self.pending.len(),
        };
        if tail > max {
            self.pending.clear();
            return Err(CodecError::LineTooLong { size: tail, max });
        }
        Ok(())
    }

    /// Pops the next complete, non-empty line with surrounding whitespace
    /// removed. Returns `None` when no full line is buffered.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.pending.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            let trimmed = trim_ascii_whitespace(&line);
            if !trimmed.is_empty() {
                return Some(trimmed.to_vec());
            }
        }
        None
    }

    /// Returns `true` when no bytes are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Serialises a message as one JSON line terminated by exactly one `\n`.
///
/// # Errors
///
/// Returns [`CodecError::Serialise`] if serialisation fails.
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec(message).map_err(CodecError::Serialise)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses one framed line.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if the line is not valid JSON of the
/// expected shape.
pub fn decode_line<T: DeserializeOwned>(line: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(trim_ascii_whitespace(line)).map_err(CodecError::Malformed)
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |pos| pos + 1);
    bytes.get(start..end).unwrap_or_default()
}
