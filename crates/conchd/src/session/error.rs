//! Connection-fatal session failures.

use std::io;
use std::str::Utf8Error;

use conch_eval::EvalFault;
use thiserror::Error;

/// A condition that ends one client's session.
///
/// Session errors never escape the connection they belong to: the server
/// logs them and cleans the client up.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from the socket failed.
    #[error("failed to read from client: {source}")]
    Read {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Writing queued output failed.
    #[error("failed to write to client: {source}")]
    Write {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The buffered command was not valid UTF-8.
    #[error("client sent invalid UTF-8: {source}")]
    InvalidUtf8 {
        /// Decoder error.
        #[source]
        source: Utf8Error,
    },
    /// Buffered input grew beyond the configured limit without a newline.
    #[error("command exceeds {limit} bytes")]
    CommandTooLarge {
        /// Configured `max_command_bytes`.
        limit: usize,
    },
    /// The evaluator reported that it cannot continue.
    #[error(transparent)]
    Evaluator(#[from] EvalFault),
    /// The evaluator panicked.
    #[error("evaluator panicked: {message}")]
    EvaluatorPanicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}
