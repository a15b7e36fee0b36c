//! BDD test world: one listening server and a set of named loopback clients.

use std::cell::RefCell;
use std::collections::HashMap;

use conch_eval::ExpressionEvaluator;

use crate::server::Server;

use super::client::{TestClient, expression_server};

/// Scenario world shared across session steps.
pub struct SessionWorld {
    server: Option<Server<ExpressionEvaluator>>,
    clients: HashMap<String, TestClient>,
    replies: HashMap<String, String>,
}

impl SessionWorld {
    #[must_use]
    pub fn new() -> Self {
        Self {
            server: None,
            clients: HashMap::new(),
            replies: HashMap::new(),
        }
    }

    pub fn start_server(&mut self) {
        self.server = Some(expression_server());
    }

    pub fn server(&mut self) -> &mut Server<ExpressionEvaluator> {
        self.server
            .as_mut()
            .expect("scenario should start a server first")
    }

    pub fn connect(&mut self, name: &str) {
        let client = TestClient::connect_and_greet(self.server());
        self.clients.insert(name.to_owned(), client);
    }

    /// Sends a full line and records the reply up to the next prompt.
    pub fn exchange(&mut self, name: &str, line: &str) {
        let server = self
            .server
            .as_mut()
            .expect("scenario should start a server first");
        let client = self
            .clients
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown client {name}"));
        let reply = client.exchange(server, line);
        self.replies.insert(name.to_owned(), reply);
    }

    /// Sends bytes with no trailing newline and lets the server read them.
    pub fn send_partial(&mut self, name: &str, text: &str) {
        let server = self
            .server
            .as_mut()
            .expect("scenario should start a server first");
        let client = self
            .clients
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown client {name}"));
        client.send(text.as_bytes());
        for _ in 0..10 {
            server.tick().expect("tick should succeed");
        }
    }

    /// Sends a full line without waiting for a prompt.
    pub fn send_line(&mut self, name: &str, line: &str) {
        self.client(name).send_line(line);
    }

    pub fn disconnect(&mut self, name: &str) {
        self.clients.remove(name);
    }

    pub fn client(&mut self, name: &str) -> &mut TestClient {
        self.clients
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown client {name}"))
    }

    /// Waits for the server to close `name`'s connection.
    pub fn await_close(&mut self, name: &str) -> bool {
        let server = self
            .server
            .as_mut()
            .expect("scenario should start a server first");
        let client = self
            .clients
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown client {name}"));
        client.await_close(server)
    }

    #[must_use]
    pub fn reply(&self, name: &str) -> &str {
        self.replies.get(name).map_or("", String::as_str)
    }
}

/// Fixture constructor used by the behaviour suite.
#[must_use]
pub fn world() -> RefCell<SessionWorld> {
    RefCell::new(SessionWorld::new())
}
