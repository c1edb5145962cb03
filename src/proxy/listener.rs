//! TCP listener and per-connection handling.
//!
//! Accepts connections on the configured address and dispatches each
//! one to its own task running probe read, SNI extraction, routing,
//! and the relay. Connections never affect each other: accept errors
//! keep the loop running and every per-connection failure is contained
//! to that connection's task.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info, Instrument};

use super::router::{RouteDecision, SharedRouter};
use super::{relay, sni};

/// Flat wall-clock cap on a connection, covering the probe read and
/// the whole relay. Not an idle timeout: a legitimate transfer still
/// running when it elapses is terminated.
pub const SESSION_DEADLINE: Duration = Duration::from_secs(30);

/// Listening socket plus the routing policy handed to every
/// connection task.
pub struct Listener {
    listener: tokio::net::TcpListener,
    router: SharedRouter,
}

impl Listener {
    /// Bind the listening socket. A bind failure is fatal for the
    /// process and propagates to the caller.
    pub async fn bind(addr: &str, router: SharedRouter) -> io::Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(listen_addr = %listener.local_addr()?, "listening");
        Ok(Self { listener, router })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, spawning a task per connection.
    pub async fn run(self) -> io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!(peer = %peer_addr, "connection accepted");
                    let router = SharedRouter::clone(&self.router);
                    tokio::spawn(
                        async move {
                            if let Err(e) = handle_connection(stream, router).await {
                                debug!(error = %e, "connection error");
                            }
                        }
                        .instrument(tracing::info_span!("connection", peer = %peer_addr)),
                    );
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                    // Avoid a tight loop on persistent accept errors.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Handle one connection under the session deadline. The deadline
/// firing is an ordinary per-connection error, never escalated.
async fn handle_connection(client: TcpStream, router: SharedRouter) -> io::Result<()> {
    match timeout(SESSION_DEADLINE, serve_connection(client, router)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "session deadline elapsed",
        )),
    }
}

/// Probe, extract, route, relay. The client connection is owned here
/// and closed on every return path.
async fn serve_connection(mut client: TcpStream, router: SharedRouter) -> io::Result<()> {
    let probe = sni::read_probe(&mut client).await?;

    let Some(server_name) = sni::extract_sni(&probe) else {
        debug!("no SNI found, dropping connection");
        return Ok(());
    };

    match router.decide(&server_name) {
        RouteDecision::Forward { target } => {
            info!(server_name = %server_name, target = %target, "forwarding");
            match relay::relay(client, &probe, &target).await {
                Ok((to_upstream, from_upstream)) => {
                    debug!(to_upstream, from_upstream, "relay finished");
                }
                Err(e) => {
                    error!(target = %target, error = %e, "upstream connection failed");
                }
            }
        }
        RouteDecision::Drop => {
            debug!(server_name = %server_name, "no rule matched, dropping connection");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::router::Router;
    use std::sync::Arc;

    #[tokio::test]
    async fn bind_on_ephemeral_port() {
        let router = Arc::new(Router::new(true, vec![], 443));
        let listener = Listener::bind("127.0.0.1:0", router).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_failure_propagates() {
        let router = Arc::new(Router::new(true, vec![], 443));
        let first = Listener::bind("127.0.0.1:0", Arc::clone(&router))
            .await
            .unwrap();
        let addr = first.local_addr().unwrap();

        let second = Listener::bind(&addr.to_string(), router).await;
        assert!(second.is_err());
    }
}
