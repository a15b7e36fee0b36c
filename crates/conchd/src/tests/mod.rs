//! Test suites for the REPL server.

mod server;
mod support;
