//! FIFO of response chunks waiting to be written to a client.

use std::collections::VecDeque;
use std::io::{self, Write};

use crate::transport::{IoOutcome, write_some};

/// How far a drain attempt got.
#[derive(Debug)]
pub(crate) enum DrainOutcome {
    /// Every queued chunk was written.
    Drained,
    /// The socket stopped accepting bytes; the rest waits for a later tick.
    Blocked,
    /// The write failed; the connection is broken.
    Failed(io::Error),
}

/// Pending output for one client.
///
/// Chunks leave the queue only once fully written. A partial write advances
/// `cursor` within the head chunk, so nothing is re-sent or reordered.
#[derive(Debug, Default)]
pub(crate) struct OutputQueue {
    chunks: VecDeque<Vec<u8>>,
    cursor: usize,
}

impl OutputQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk. Empty chunks are ignored.
    pub(crate) fn push(&mut self, chunk: impl Into<Vec<u8>>) {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.chunks.push_back(chunk);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Bytes still to be written, accounting for a partially sent head.
    pub(crate) fn pending_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum::<usize>() - self.cursor
    }

    /// Writes queued chunks in order until the queue empties or `writer`
    /// pushes back. Returns the outcome and the number of bytes written.
    pub(crate) fn flush_into<W: Write>(&mut self, writer: &mut W) -> (DrainOutcome, usize) {
        let mut written = 0;
        while let Some(head) = self.chunks.front() {
            let remaining = head.get(self.cursor..).unwrap_or_default();
            match write_some(writer, remaining) {
                IoOutcome::Ready(count) => {
                    written += count;
                    if count >= remaining.len() {
                        self.chunks.pop_front();
                        self.cursor = 0;
                    } else {
                        self.cursor += count;
                    }
                }
                IoOutcome::NotReady => return (DrainOutcome::Blocked, written),
                IoOutcome::Failed(error) => return (DrainOutcome::Failed(error), written),
            }
        }
        (DrainOutcome::Drained, written)
    }
}
