//! Active client connections and their per-session buffers.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{SocketAddr, TcpStream};
use std::os::fd::{AsFd, BorrowedFd};

use super::{InputBuffer, OutputQueue};

/// Identifier assigned to a client when it is accepted.
///
/// Identifiers are never reused within one server, so a stale id can never
/// address a newer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "client-{}", self.0)
    }
}

/// One accepted socket with its input buffer and output queue.
#[derive(Debug)]
pub(crate) struct ClientConnection {
    pub(crate) stream: TcpStream,
    pub(crate) peer: Option<SocketAddr>,
    pub(crate) input: InputBuffer,
    pub(crate) output: OutputQueue,
}

/// Exclusive owner of every active client socket.
#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    clients: BTreeMap<ClientId, ClientConnection>,
    next_id: u64,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Admits `stream`, creating its buffer and queue together.
    pub(crate) fn insert(
        &mut self,
        stream: TcpStream,
        peer: Option<SocketAddr>,
        max_command_bytes: usize,
    ) -> ClientId {
        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.clients.insert(
            id,
            ClientConnection {
                stream,
                peer,
                input: InputBuffer::new(max_command_bytes),
                output: OutputQueue::new(),
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, id: ClientId) -> Option<&mut ClientConnection> {
        self.clients.get_mut(&id)
    }

    /// Removes a client. Returns `None` when it was already gone.
    pub(crate) fn remove(&mut self, id: ClientId) -> Option<ClientConnection> {
        self.clients.remove(&id)
    }

    pub(crate) fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Snapshot of active ids in accept order.
    pub(crate) fn ids(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    /// Descriptors of every active client, for readiness polling.
    pub(crate) fn watched(&self) -> impl Iterator<Item = (ClientId, BorrowedFd<'_>)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.stream.as_fd()))
    }

    pub(crate) fn len(&self) -> usize {
        self.clients.len()
    }
}
