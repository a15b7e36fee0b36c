//! Non-blocking detection of termination signals.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Abstraction over shutdown notification mechanisms.
///
/// The host checks it once per tick, so implementations must not block.
pub trait ShutdownSignal {
    /// Returns `true` once shutdown should proceed.
    fn requested(&mut self) -> bool;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that watches for termination signals.
pub struct SystemShutdownSignal {
    signals: Signals,
    received: Option<i32>,
}

impl SystemShutdownSignal {
    /// Registers handlers for SIGTERM, SIGINT, SIGQUIT and SIGHUP.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self {
            signals,
            received: None,
        })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn requested(&mut self) -> bool {
        if self.received.is_none()
            && let Some(signal) = self.signals.pending().next()
        {
            info!(
                target: PROCESS_TARGET,
                signal,
                "shutdown signal received"
            );
            self.received = Some(signal);
        }
        self.received.is_some()
    }
}
