//! Per-connection session state.
//!
//! Every accepted client owns exactly one [`InputBuffer`] and one
//! [`OutputQueue`]; both are created when the [`ConnectionRegistry`] admits
//! the socket and dropped with it on cleanup.

mod buffer;
mod error;
mod queue;
mod registry;

pub(crate) use self::buffer::InputBuffer;
pub use self::error::SessionError;
pub(crate) use self::queue::{DrainOutcome, OutputQueue};
pub(crate) use self::registry::{ClientConnection, ConnectionRegistry};
pub use self::registry::ClientId;

pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");
