//! Non-blocking socket plumbing for the server tick.
//!
//! The transport module binds the single listening endpoint, classifies every
//! socket operation into an [`IoOutcome`], and reports which sockets are ready
//! through a zero-timeout `poll(2)` readiness check.

mod errors;
mod io;
mod listener;
mod poll;

pub use self::errors::{ListenerError, PollError};
pub use self::io::IoOutcome;
pub(crate) use self::io::{read_some, write_some};
pub(crate) use self::listener::{accept, bind_listener};
pub(crate) use self::poll::{Readiness, poll_readiness};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
