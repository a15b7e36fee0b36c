//! Admitting new connections.

use std::net::TcpListener;

use tracing::{debug, info, warn};

use crate::session::{ClientId, ConnectionRegistry};
use crate::transport::{IoOutcome, accept, write_some};

use super::cleanup::{CloseReason, cleanup};
use super::{SERVER_TARGET, ServerSettings};

/// Accepts at most one pending connection.
///
/// The new client gets its initial prompt straight away. Whatever the socket
/// does not take immediately is queued and drained like any other output.
pub(super) fn accept_one(
    listener: &TcpListener,
    registry: &mut ConnectionRegistry,
    settings: &ServerSettings,
) -> Option<ClientId> {
    let (stream, peer) = match accept(listener) {
        IoOutcome::Ready(accepted) => accepted,
        IoOutcome::NotReady => return None,
        IoOutcome::Failed(error) => {
            warn!(
                target: SERVER_TARGET,
                error = %error,
                "failed to accept connection"
            );
            return None;
        }
    };

    let id = registry.insert(stream, Some(peer), settings.max_command_bytes);
    info!(
        target: SERVER_TARGET,
        client = %id,
        peer = %peer,
        clients = registry.len(),
        "client connected"
    );
    send_initial_prompt(registry, id, settings.prompt.as_bytes());
    registry.contains(id).then_some(id)
}

fn send_initial_prompt(registry: &mut ConnectionRegistry, id: ClientId, prompt: &[u8]) {
    let Some(client) = registry.get_mut(id) else {
        return;
    };
    match write_some(&mut client.stream, prompt) {
        IoOutcome::Ready(written) => {
            client.output.push(prompt.get(written..).unwrap_or_default());
        }
        IoOutcome::NotReady => {
            debug!(
                target: SERVER_TARGET,
                client = %id,
                "initial prompt deferred"
            );
            client.output.push(prompt);
        }
        IoOutcome::Failed(error) => {
            warn!(
                target: SERVER_TARGET,
                client = %id,
                error = %error,
                "failed to send initial prompt"
            );
            cleanup(registry, id, CloseReason::WriteFailed);
        }
    }
}
