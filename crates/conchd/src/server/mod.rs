//! The tick-driven REPL server.
//!
//! [`Server::tick`] performs one bounded, non-blocking pass and returns. It
//! never loops waiting for I/O; a host scheduler decides when the next tick
//! runs. Each pass works in a fixed order:
//!
//! 1. bind the listening socket if it does not exist yet;
//! 2. poll the listener and every client for readiness;
//! 3. accept at most one connection and service each readable client;
//! 4. clean up sockets reported as exceptional;
//! 5. drain every client's output queue as far as the sockets allow.
//!
//! Failures that belong to one connection end that connection only. Failures
//! in binding or polling are returned as a [`TickError`] for the host to
//! observe; the server remains usable and the next tick retries.

mod accept;
mod cleanup;
mod client;
mod drain;

use std::net::{SocketAddr, TcpListener};
use std::os::fd::AsFd;

use conch_config::{Config, ListenEndpoint};
use conch_eval::{Evaluator, Namespace, Value};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::session::{ClientId, ConnectionRegistry, SESSION_TARGET};
use crate::transport::{ListenerError, PollError, Readiness, bind_listener, poll_readiness};

use self::cleanup::{CloseReason, cleanup};
use self::client::{Disposition, SessionContext};

pub(crate) const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Name bound in every new namespace to the server version.
pub const VERSION_BINDING: &str = "__version__";

/// Tunables the server reads on every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Endpoint bound on the first tick.
    pub listen: ListenEndpoint,
    /// Maximum bytes read from one client per tick.
    pub read_chunk_size: usize,
    /// Cap on buffered input without a newline.
    pub max_command_bytes: usize,
    /// Prompt sent on connect and after each command.
    pub prompt: String,
}

impl ServerSettings {
    /// Extracts server settings from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            listen: config.listen().clone(),
            read_chunk_size: config.read_chunk_size(),
            max_command_bytes: config.max_command_bytes(),
            prompt: config.prompt().to_owned(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Failures that abort a tick before any socket is serviced.
#[derive(Debug, Error)]
pub enum TickError {
    /// The listening socket could not be created.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The readiness check failed.
    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Work performed by one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Connections accepted.
    pub accepted: usize,
    /// Commands handed to the evaluator.
    pub evaluated: usize,
    /// Clients cleaned up for any reason.
    pub closed: usize,
    /// Bytes written while draining output queues.
    pub bytes_written: usize,
    /// Clients still connected when the tick finished.
    pub active_clients: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Listener,
    Client(ClientId),
}

/// Single-threaded REPL server sharing one namespace across all clients.
#[derive(Debug)]
pub struct Server<E> {
    settings: ServerSettings,
    listener: Option<TcpListener>,
    registry: ConnectionRegistry,
    namespace: Namespace,
    evaluator: E,
    read_buffer: Vec<u8>,
}

impl<E> Server<E>
where
    E: Evaluator,
{
    /// Creates a server that binds lazily on its first tick.
    ///
    /// The namespace is created here, once, and lives as long as the server.
    pub fn new(settings: ServerSettings, evaluator: E) -> Self {
        let namespace = Namespace::new().with_binding(
            VERSION_BINDING,
            Value::Str(env!("CARGO_PKG_VERSION").to_owned()),
        );
        let read_buffer = vec![0; settings.read_chunk_size.max(1)];
        Self {
            settings,
            listener: None,
            registry: ConnectionRegistry::new(),
            namespace,
            evaluator,
            read_buffer,
        }
    }

    /// Runs one non-blocking pass over the listener and all clients.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] when the listener cannot be bound or the
    /// readiness poll fails. Per-connection failures are handled internally.
    pub fn tick(&mut self) -> Result<TickReport, TickError> {
        self.ensure_listening()?;
        let readiness = self.poll()?;
        let mut report = TickReport::default();

        for token in readiness.readable {
            match token {
                Token::Listener => {
                    if let Some(listener) = &self.listener
                        && accept::accept_one(listener, &mut self.registry, &self.settings)
                            .is_some()
                    {
                        report.accepted += 1;
                    }
                }
                Token::Client(id) => self.service_client(id, &mut report),
            }
        }

        for token in readiness.exceptional {
            match token {
                Token::Listener => {
                    warn!(
                        target: SERVER_TARGET,
                        "listening socket reported an error; rebinding on the next tick"
                    );
                    self.listener = None;
                }
                Token::Client(id) => {
                    if cleanup(&mut self.registry, id, CloseReason::SocketError) {
                        report.closed += 1;
                    }
                }
            }
        }

        let drained = drain::drain_all(&mut self.registry);
        report.bytes_written = drained.bytes_written;
        report.closed += drained.closed;
        report.active_clients = self.registry.len();

        trace!(
            target: SERVER_TARGET,
            accepted = report.accepted,
            evaluated = report.evaluated,
            closed = report.closed,
            bytes_written = report.bytes_written,
            active_clients = report.active_clients,
            "tick complete"
        );
        Ok(report)
    }

    fn ensure_listening(&mut self) -> Result<(), ListenerError> {
        if self.listener.is_none() {
            self.listener = Some(bind_listener(&self.settings.listen)?);
        }
        Ok(())
    }

    fn poll(&self) -> Result<Readiness<Token>, PollError> {
        let mut watched = Vec::with_capacity(self.registry.len() + 1);
        if let Some(listener) = &self.listener {
            watched.push((Token::Listener, listener.as_fd()));
        }
        watched.extend(
            self.registry
                .watched()
                .map(|(id, fd)| (Token::Client(id), fd)),
        );
        poll_readiness(&watched)
    }

    fn service_client(&mut self, id: ClientId, report: &mut TickReport) {
        let Some(client) = self.registry.get_mut(id) else {
            return;
        };
        let context = SessionContext {
            evaluator: &mut self.evaluator,
            namespace: &mut self.namespace,
            prompt: &self.settings.prompt,
            read_buffer: &mut self.read_buffer,
        };
        let reason = match client::service(id, client, context) {
            Ok(Disposition::Idle) => return,
            Ok(Disposition::Evaluated) => {
                report.evaluated += 1;
                return;
            }
            Ok(Disposition::PeerClosed) => CloseReason::PeerClosed,
            Ok(Disposition::ExitRequested) => CloseReason::ExitRequested,
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    client = %id,
                    error = %error,
                    "dropping client after session error"
                );
                CloseReason::SessionError
            }
        };
        if cleanup(&mut self.registry, id, reason) {
            report.closed += 1;
        }
    }

    /// Cleans up every client and closes the listening socket.
    ///
    /// A later [`tick`](Self::tick) binds again.
    pub fn shutdown(&mut self) {
        let clients = self.registry.ids();
        for id in &clients {
            cleanup(&mut self.registry, *id, CloseReason::ServerShutdown);
        }
        if self.listener.take().is_some() {
            info!(
                target: SERVER_TARGET,
                clients = clients.len(),
                "server shut down"
            );
        }
    }
}

impl<E> Server<E> {
    /// Address of the bound listener, once the first tick has bound it.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
    }

    /// Whether the listening socket is currently bound.
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Number of connected clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// The namespace shared by every session.
    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Settings the server was created with.
    #[must_use]
    pub const fn settings(&self) -> &ServerSettings {
        &self.settings
    }
}
