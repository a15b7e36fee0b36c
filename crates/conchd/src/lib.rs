//! A single-threaded, non-blocking TCP REPL server.
//!
//! Any number of clients connect to one listening port. Each connection runs
//! an interactive, line-buffered session: bytes accumulate until a newline
//! arrives, the buffered text is evaluated as one command, and the captured
//! output is queued back followed by a fresh prompt. Every session evaluates
//! against the same [`Namespace`](conch_eval::Namespace), so a name bound by
//! one client is visible to the next command of any other.
//!
//! The server owns no thread and no event loop. [`Server::tick`] performs one
//! bounded pass (accept, read, clean up, drain) and returns; a host decides
//! when to call it again. [`run_server`] is that host for the `conchd`
//! binary, ticking on a fixed interval until a termination signal arrives.
//!
//! Evaluation is synchronous. A slow command holds up every client until it
//! finishes; there is no per-command timeout.

mod bootstrap;
mod health;
mod process;
mod server;
mod session;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_server};
pub use server::{Server, ServerSettings, TickError, TickReport, VERSION_BINDING};
pub use session::{ClientId, SessionError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{IoOutcome, ListenerError, PollError};

#[cfg(test)]
mod tests;
