//! Accumulates inbound bytes until a command is complete.

use super::SessionError;

/// Raw bytes received from one client and not yet evaluated.
///
/// Bytes are kept undecoded until a command is extracted so multi-byte
/// characters split across reads survive intact.
#[derive(Debug)]
pub(crate) struct InputBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl InputBuffer {
    pub(crate) const fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
        }
    }

    pub(crate) fn extend(&mut self, chunk: &[u8]) -> Result<(), SessionError> {
        if self.bytes.len().saturating_add(chunk.len()) > self.limit {
            return Err(SessionError::CommandTooLarge { limit: self.limit });
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    /// Takes the whole buffer as one command once it holds a newline.
    ///
    /// Everything buffered so far becomes the command, including text after
    /// the last newline, so several lines that arrive together are evaluated
    /// as one multi-line command. Surrounding whitespace is trimmed.
    pub(crate) fn take_command(&mut self) -> Result<Option<String>, SessionError> {
        if !self.bytes.contains(&b'\n') {
            return Ok(None);
        }
        let bytes = std::mem::take(&mut self.bytes);
        let text =
            std::str::from_utf8(&bytes).map_err(|source| SessionError::InvalidUtf8 { source })?;
        Ok(Some(text.trim().to_owned()))
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }
}
