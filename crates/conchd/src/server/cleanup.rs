//! Removing a client from the server.

use std::net::Shutdown;

use tracing::{debug, info};

use crate::session::{ClientId, ConnectionRegistry};

use super::SERVER_TARGET;

/// Why a client was cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CloseReason {
    PeerClosed,
    ExitRequested,
    SocketError,
    SessionError,
    WriteFailed,
    ServerShutdown,
}

impl CloseReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::PeerClosed => "peer_closed",
            Self::ExitRequested => "exit_requested",
            Self::SocketError => "socket_error",
            Self::SessionError => "session_error",
            Self::WriteFailed => "write_failed",
            Self::ServerShutdown => "server_shutdown",
        }
    }
}

/// Drops `id` from the registry together with its buffer and queue, then
/// closes the socket.
///
/// Returns `false` when the client was already gone, so calling this twice
/// is harmless. Close-time errors are ignored.
pub(super) fn cleanup(registry: &mut ConnectionRegistry, id: ClientId, reason: CloseReason) -> bool {
    let Some(client) = registry.remove(id) else {
        return false;
    };

    let peer = client
        .peer
        .or_else(|| client.stream.peer_addr().ok())
        .map_or_else(|| "unknown".to_owned(), |addr| addr.to_string());
    info!(
        target: SERVER_TARGET,
        client = %id,
        peer = %peer,
        reason = reason.as_str(),
        discarded_input = client.input.len(),
        discarded_output = client.output.pending_bytes(),
        "client disconnected"
    );

    if let Err(error) = client.stream.shutdown(Shutdown::Both) {
        debug!(
            target: SERVER_TARGET,
            client = %id,
            error = %error,
            "ignoring socket shutdown error"
        );
    }
    true
}
