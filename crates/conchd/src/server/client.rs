//! Reading from a client and running its commands.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use conch_eval::{Evaluator, Namespace, OutputCapture};
use tracing::debug;

use crate::session::{ClientConnection, ClientId, SESSION_TARGET, SessionError};
use crate::transport::{IoOutcome, read_some};

const TERMINATION_WORDS: [&str; 2] = ["exit", "quit"];

/// What servicing a readable client produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Disposition {
    /// Nothing complete yet; keep the client.
    Idle,
    /// A command ran and its output plus a prompt were queued.
    Evaluated,
    /// The peer closed its end.
    PeerClosed,
    /// The client asked to disconnect.
    ExitRequested,
}

/// Server state a session borrows while one client is serviced.
pub(super) struct SessionContext<'a, E> {
    pub(super) evaluator: &'a mut E,
    pub(super) namespace: &'a mut Namespace,
    pub(super) prompt: &'a str,
    pub(super) read_buffer: &'a mut [u8],
}

/// Reads one chunk from `client` and evaluates a command if one completed.
pub(super) fn service<E: Evaluator>(
    id: ClientId,
    client: &mut ClientConnection,
    context: SessionContext<'_, E>,
) -> Result<Disposition, SessionError> {
    let count = match read_some(&mut client.stream, context.read_buffer) {
        IoOutcome::Ready(0) => return Ok(Disposition::PeerClosed),
        IoOutcome::Ready(count) => count,
        IoOutcome::NotReady => return Ok(Disposition::Idle),
        IoOutcome::Failed(source) => return Err(SessionError::Read { source }),
    };
    client
        .input
        .extend(context.read_buffer.get(..count).unwrap_or_default())?;

    let Some(command) = client.input.take_command()? else {
        return Ok(Disposition::Idle);
    };
    if is_termination(&command) {
        return Ok(Disposition::ExitRequested);
    }

    debug!(
        target: SESSION_TARGET,
        client = %id,
        bytes = command.len(),
        "evaluating command"
    );
    let output = evaluate(context.evaluator, &command, context.namespace)?;
    client.output.push(output);
    client.output.push(context.prompt);
    Ok(Disposition::Evaluated)
}

fn is_termination(command: &str) -> bool {
    TERMINATION_WORDS
        .iter()
        .any(|word| command.eq_ignore_ascii_case(word))
}

/// Runs `command` with output redirected into a fresh capture.
///
/// The capture exists only for this call. A panicking evaluator is reported
/// as a session error instead of unwinding through the tick.
fn evaluate<E: Evaluator>(
    evaluator: &mut E,
    command: &str,
    namespace: &mut Namespace,
) -> Result<String, SessionError> {
    let mut capture = OutputCapture::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        evaluator.evaluate(command, namespace, &mut capture)
    }));
    match outcome {
        Ok(Ok(())) => {
            if capture.is_truncated() {
                debug!(target: SESSION_TARGET, "evaluator output exceeded the capture limit");
            }
            Ok(capture.into_string())
        }
        Ok(Err(fault)) => Err(fault.into()),
        Err(payload) => Err(SessionError::EvaluatorPanicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
