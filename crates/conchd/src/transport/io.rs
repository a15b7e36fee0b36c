//! Tri-state classification of non-blocking socket operations.

use std::io::{self, Read, Write};

/// Result of a non-blocking operation.
///
/// Would-block is ordinary flow control rather than a failure, so it gets
/// its own variant instead of travelling through `io::Error`.
#[derive(Debug)]
pub enum IoOutcome<T> {
    /// The operation completed.
    Ready(T),
    /// The socket was not ready; retry on a later tick.
    NotReady,
    /// The operation failed for any other reason.
    Failed(io::Error),
}

impl<T> From<io::Result<T>> for IoOutcome<T> {
    fn from(result: io::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Self::NotReady
            }
            Err(error) => Self::Failed(error),
        }
    }
}

/// Reads at most `buffer.len()` bytes.
pub(crate) fn read_some<R: Read>(reader: &mut R, buffer: &mut [u8]) -> IoOutcome<usize> {
    reader.read(buffer).into()
}

/// Writes as much of `bytes` as the peer accepts right now.
///
/// A zero-length write of a non-empty slice is reported as
/// [`io::ErrorKind::WriteZero`].
pub(crate) fn write_some<W: Write>(writer: &mut W, bytes: &[u8]) -> IoOutcome<usize> {
    match writer.write(bytes) {
        Ok(0) if !bytes.is_empty() => IoOutcome::Failed(io::ErrorKind::WriteZero.into()),
        other => other.into(),
    }
}
