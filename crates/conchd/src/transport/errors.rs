//! Error types for listener and readiness operations.

use std::io;
use std::net::SocketAddr;

use nix::errno::Errno;
use thiserror::Error;

/// Errors surfaced while creating the listening socket.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host name resolution failed.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no addresses.
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// Every resolved address refused to bind; the last failure is kept.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Address that failed last.
        addr: SocketAddr,
        /// Bind error.
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to non-blocking mode.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// The readiness primitive itself failed.
///
/// Per-socket conditions such as `POLLNVAL` are not errors; they are reported
/// as exceptional sockets.
#[derive(Debug, Error)]
pub enum PollError {
    /// `poll(2)` returned an error.
    #[error("readiness poll over {watched} sockets failed: {source}")]
    Poll {
        /// Number of sockets being watched.
        watched: usize,
        /// Errno reported by the system call.
        #[source]
        source: Errno,
    },
}
