//! Per-call replacement for a session's standard streams.

use std::fmt;

/// Bytes one evaluation may write before further output is refused.
pub const MAX_CAPTURE_BYTES: usize = 2 * 1024 * 1024;

/// Collects everything an evaluator prints during one call.
///
/// Both streams append to the same buffer in write order, matching what a
/// terminal would show when stdout and stderr share one console. The buffer
/// never grows past its limit: a write that does not fit is dropped whole and
/// the capture is marked truncated.
#[derive(Debug)]
pub struct OutputCapture {
    buffer: String,
    limit: usize,
    truncated: bool,
}

/// One of the two logical streams of an [`OutputCapture`].
#[derive(Debug)]
pub struct Stream<'a> {
    capture: &'a mut OutputCapture,
}

impl Default for OutputCapture {
    fn default() -> Self {
        Self::with_limit(MAX_CAPTURE_BYTES)
    }
}

impl OutputCapture {
    /// Creates an empty capture bounded by [`MAX_CAPTURE_BYTES`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty capture that holds at most `limit` bytes.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            buffer: String::new(),
            limit,
            truncated: false,
        }
    }

    /// Standard output stream.
    pub fn stdout(&mut self) -> Stream<'_> {
        Stream { capture: self }
    }

    /// Standard error stream.
    pub fn stderr(&mut self) -> Stream<'_> {
        Stream { capture: self }
    }

    /// Bytes that can still be written.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.buffer.len())
    }

    /// Whether a write was dropped for exceeding the limit.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Consumes the capture, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }

    fn append(&mut self, parts: &[&str]) -> bool {
        let needed = parts.iter().map(|part| part.len()).sum::<usize>();
        if needed > self.remaining() {
            self.truncated = true;
            return false;
        }
        for part in parts {
            self.buffer.push_str(part);
        }
        true
    }
}

impl Stream<'_> {
    /// Appends `text` followed by a newline, or nothing if both do not fit.
    pub fn line(&mut self, text: &str) {
        self.capture.append(&[text, "\n"]);
    }
}

impl fmt::Write for Stream<'_> {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        if self.capture.append(&[text]) {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}
