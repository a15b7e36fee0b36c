//! Zero-timeout readiness checks over the watched sockets.

use std::os::fd::BorrowedFd;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use tracing::trace;

use super::{PollError, TRANSPORT_TARGET};

/// Sockets that became readable or exceptional, keyed by the caller's token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Readiness<K> {
    pub(crate) readable: Vec<K>,
    pub(crate) exceptional: Vec<K>,
}

impl<K> Readiness<K> {
    const fn empty() -> Self {
        Self {
            readable: Vec::new(),
            exceptional: Vec::new(),
        }
    }
}

/// Polls `watched` once without blocking.
///
/// Hang-ups count as readable so the following zero-length read reports the
/// close; `POLLERR` and `POLLNVAL` are exceptional. An interrupted poll is
/// treated as "nothing ready".
pub(crate) fn poll_readiness<K: Copy>(
    watched: &[(K, BorrowedFd<'_>)],
) -> Result<Readiness<K>, PollError> {
    if watched.is_empty() {
        return Ok(Readiness::empty());
    }

    let mut fds: Vec<PollFd<'_>> = watched
        .iter()
        .map(|(_, fd)| PollFd::new(*fd, PollFlags::POLLIN))
        .collect();

    match poll(&mut fds, PollTimeout::ZERO) {
        Ok(0) | Err(Errno::EINTR) => return Ok(Readiness::empty()),
        Ok(_) => {}
        Err(source) => {
            return Err(PollError::Poll {
                watched: watched.len(),
                source,
            });
        }
    }

    let mut readiness = Readiness::empty();
    for ((key, _), fd) in watched.iter().zip(&fds) {
        let Some(events) = fd.revents() else {
            continue;
        };
        if events.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
            readiness.exceptional.push(*key);
        } else if events.intersects(PollFlags::POLLIN | PollFlags::POLLHUP) {
            readiness.readable.push(*key);
        }
    }
    trace!(
        target: TRANSPORT_TARGET,
        watched = watched.len(),
        readable = readiness.readable.len(),
        exceptional = readiness.exceptional.len(),
        "readiness polled"
    );
    Ok(readiness)
}
