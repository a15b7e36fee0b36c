//! Flushing output queues without blocking.

use tracing::{trace, warn};

use crate::session::{ConnectionRegistry, DrainOutcome, SESSION_TARGET, SessionError};

use super::cleanup::{CloseReason, cleanup};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct DrainReport {
    pub(super) bytes_written: usize,
    pub(super) closed: usize,
}

/// Writes each client's queue in order until it empties or the socket would
/// block. A blocked client is left for the next tick; a failed write cleans
/// the client up.
pub(super) fn drain_all(registry: &mut ConnectionRegistry) -> DrainReport {
    let mut report = DrainReport::default();
    for id in registry.ids() {
        let Some(client) = registry.get_mut(id) else {
            continue;
        };
        if client.output.is_empty() {
            continue;
        }

        let (outcome, written) = client.output.flush_into(&mut client.stream);
        report.bytes_written += written;
        match outcome {
            DrainOutcome::Drained => {}
            DrainOutcome::Blocked => {
                trace!(
                    target: SESSION_TARGET,
                    client = %id,
                    pending = client.output.pending_bytes(),
                    "output blocked until a later tick"
                );
            }
            DrainOutcome::Failed(source) => {
                let error = SessionError::Write { source };
                warn!(
                    target: SESSION_TARGET,
                    client = %id,
                    error = %error,
                    "dropping client after write failure"
                );
                if cleanup(registry, id, CloseReason::WriteFailed) {
                    report.closed += 1;
                }
            }
        }
    }
    report
}
