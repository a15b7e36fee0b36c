//! Binding and accepting on the single listening endpoint.

use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use conch_config::ListenEndpoint;

use super::io::IoOutcome;
use super::{ListenerError, TRANSPORT_TARGET};

/// Binds a non-blocking TCP listener for `endpoint`.
///
/// Each resolved address is tried in turn. The standard library enables
/// `SO_REUSEADDR` on Unix, so a restart does not trip over a previous socket
/// still in `TIME_WAIT`.
pub(crate) fn bind_listener(endpoint: &ListenEndpoint) -> Result<TcpListener, ListenerError> {
    let host = endpoint.host();
    let port = endpoint.port();
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;

    let mut last_error = None;
    for addr in addrs {
        match TcpListener::bind(addr) {
            Ok(listener) => {
                listener
                    .set_nonblocking(true)
                    .map_err(|source| ListenerError::NonBlocking { source })?;
                info!(
                    target: TRANSPORT_TARGET,
                    endpoint = %endpoint,
                    addr = %listener.local_addr().unwrap_or(addr),
                    "listening socket bound"
                );
                return Ok(listener);
            }
            Err(source) => {
                debug!(
                    target: TRANSPORT_TARGET,
                    %addr,
                    error = %source,
                    "bind attempt failed"
                );
                last_error = Some(ListenerError::BindTcp { addr, source });
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    }))
}

/// Accepts one pending connection and switches it to non-blocking mode.
pub(crate) fn accept(listener: &TcpListener) -> IoOutcome<(TcpStream, SocketAddr)> {
    match IoOutcome::from(listener.accept()) {
        IoOutcome::Ready((stream, peer)) => match stream.set_nonblocking(true) {
            Ok(()) => IoOutcome::Ready((stream, peer)),
            Err(error) => IoOutcome::Failed(error),
        },
        other => other,
    }
}
