//! Loopback clients driven in lockstep with [`Server::tick`].
//!
//! Everything runs on the test thread: the client socket is non-blocking and
//! each wait alternates one tick with one read attempt.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use conch_config::ListenEndpoint;
use conch_eval::{Evaluator, ExpressionEvaluator};

use crate::server::{Server, ServerSettings};

const MAX_TICKS: usize = 2_000;
const PAUSE: Duration = Duration::from_millis(1);

/// Settings that bind an ephemeral loopback port.
#[must_use]
pub fn loopback_settings() -> ServerSettings {
    ServerSettings {
        listen: ListenEndpoint::tcp("127.0.0.1", 0),
        ..ServerSettings::default()
    }
}

/// Builds a server over `evaluator` and ticks it once so it is listening.
pub fn listening_server<E: Evaluator>(settings: ServerSettings, evaluator: E) -> Server<E> {
    let mut server = Server::new(settings, evaluator);
    server.tick().expect("first tick should bind the listener");
    assert!(server.is_listening(), "listener should be bound");
    server
}

/// Default server running the built-in expression evaluator.
#[must_use]
pub fn expression_server() -> Server<ExpressionEvaluator> {
    listening_server(loopback_settings(), ExpressionEvaluator::new())
}

/// Ticks `server` until `condition` holds or the tick budget runs out.
pub fn tick_until<E: Evaluator>(
    server: &mut Server<E>,
    mut condition: impl FnMut(&Server<E>) -> bool,
) -> bool {
    for _ in 0..MAX_TICKS {
        server.tick().expect("tick should succeed");
        if condition(&*server) {
            return true;
        }
        thread::sleep(PAUSE);
    }
    false
}

/// A raw TCP client that accumulates everything the server sends.
#[derive(Debug)]
pub struct TestClient {
    stream: TcpStream,
    received: Vec<u8>,
    closed: bool,
}

impl TestClient {
    /// Connects to the server's bound address.
    pub fn connect<E>(server: &Server<E>) -> Self {
        let addr: SocketAddr = server.local_addr().expect("server should be listening");
        let stream = TcpStream::connect(addr).expect("connect to server");
        stream
            .set_nonblocking(true)
            .expect("make client non-blocking");
        Self {
            stream,
            received: Vec::new(),
            closed: false,
        }
    }

    /// Connects and waits for the initial prompt.
    pub fn connect_and_greet<E: Evaluator>(server: &mut Server<E>) -> Self {
        let mut client = Self::connect(server);
        let prompt = server.settings().prompt.clone();
        assert!(
            client.await_output(server, &prompt),
            "expected an initial prompt, got {:?}",
            client.transcript()
        );
        client.clear();
        client
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("send to server");
    }

    pub fn send_line(&mut self, line: &str) {
        self.send(format!("{line}\n").as_bytes());
    }

    /// Everything received since the last [`clear`](Self::clear).
    #[must_use]
    pub fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.received).into_owned()
    }

    pub fn clear(&mut self) {
        self.received.clear();
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads whatever is available without blocking.
    pub fn collect(&mut self) {
        let mut chunk = [0_u8; 1024];
        while !self.closed {
            match self.stream.read(&mut chunk) {
                Ok(0) => self.closed = true,
                Ok(count) => self.received.extend_from_slice(&chunk[..count]),
                Err(error) if error.kind() == ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(_) => self.closed = true,
            }
        }
    }

    /// Ticks until the transcript ends with `expected`.
    pub fn await_output<E: Evaluator>(&mut self, server: &mut Server<E>, expected: &str) -> bool {
        self.await_condition(server, |client| client.transcript().ends_with(expected))
    }

    /// Ticks until the server closes this connection.
    pub fn await_close<E: Evaluator>(&mut self, server: &mut Server<E>) -> bool {
        self.await_condition(server, |client| client.closed)
    }

    /// Sends `line` and returns the reply up to and including the next prompt.
    pub fn exchange<E: Evaluator>(&mut self, server: &mut Server<E>, line: &str) -> String {
        let prompt = server.settings().prompt.clone();
        self.clear();
        self.send_line(line);
        assert!(
            self.await_output(server, &prompt),
            "no prompt after {line:?}, got {:?}",
            self.transcript()
        );
        self.transcript()
    }

    fn await_condition<E: Evaluator>(
        &mut self,
        server: &mut Server<E>,
        mut condition: impl FnMut(&Self) -> bool,
    ) -> bool {
        for _ in 0..MAX_TICKS {
            server.tick().expect("tick should succeed");
            self.collect();
            if condition(&*self) {
                return true;
            }
            if self.closed {
                return false;
            }
            thread::sleep(PAUSE);
        }
        false
    }
}
