//! Per-connection state machine: handshake, read/dispatch loop, teardown.
//!
//! Each accepted socket is split into halves.  The read half is consumed by
//! [`run_connection`]'s loop on the connection's own task; the write half
//! lives in a [`ConnectionHandle`] shared through the registry, because the
//! broadcaster writes to it from other connections' tasks.
//!
//! A connection leaves the loop for exactly one of: the peer closed its end,
//! the peer sent `exit` or `down`, the read faulted, or the server-wide
//! shutdown signal fired.  Whichever way it leaves, the teardown sequence is
//! the same and every step of it tolerates having already happened.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use chatrelay_core::{line_reader, Command, WELCOME_LINE};

use crate::application::registry::{ConnectionId, LineSink, SendError};
use crate::infrastructure::network::listener::RelayServer;

/// Write side and lifecycle state of one accepted connection.
///
/// The write half sits behind an async mutex so relay writes from other
/// tasks serialize; it becomes `None` once the connection has been torn
/// down, and stays `None` forever.
pub struct ConnectionHandle {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<Option<OwnedWriteHalf>>,
    alive: AtomicBool,
}

impl ConnectionHandle {
    pub(crate) fn new(peer: SocketAddr, writer: OwnedWriteHalf) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            writer: Mutex::new(Some(writer)),
            alive: AtomicBool::new(true),
        }
    }

    /// Address of the remote peer, for log lines.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Whether teardown has begun.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LineSink for ConnectionHandle {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_line(&self, line: &str) -> Result<(), SendError> {
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(writer) => chatrelay_core::write_line(writer, line)
                .await
                .map_err(SendError::Io),
            None => Err(SendError::ConnectionClosed),
        }
    }

    /// The first call takes the write half out and shuts it down, swallowing
    /// the close error.  Every later call finds the slot empty and returns
    /// immediately, so the racing teardown paths (self-exit vs. the server
    /// drain) are both safe.
    async fn disconnect(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let taken = self.writer.lock().await.take();
        if let Some(mut writer) = taken {
            if let Err(e) = writer.shutdown().await {
                debug!("closing write half for {}: {e}", self.peer);
            }
        }
    }
}

/// Runs one connection from accept to teardown.
///
/// Handshake first: the welcome line is written *before* the handle joins
/// the registry, so no broadcast can reach this connection ahead of the
/// greeting.  A handshake failure skips registration entirely.
///
/// The read loop races each blocking read against the server's shutdown
/// signal, so a connection blocked on a silent peer still unwinds promptly
/// when the server goes down.
pub(crate) async fn run_connection(server: Arc<RelayServer>, stream: TcpStream, peer: SocketAddr) {
    let (read_half, write_half) = stream.into_split();
    let handle = Arc::new(ConnectionHandle::new(peer, write_half));

    if let Err(e) = handle.send_line(WELCOME_LINE).await {
        warn!("handshake with {peer} failed: {e}");
        handle.disconnect().await;
        return;
    }
    server.registry().add(Arc::clone(&handle) as Arc<dyn LineSink>);

    // Subscribe before re-checking the running flag: a shutdown that flips
    // the flag after this check must therefore signal after the subscription,
    // so it cannot slip between the two.  A shutdown that raced the
    // registration above is caught here, and the teardown below undoes it.
    let mut shutdown_rx = server.subscribe_shutdown();
    if !server.is_running() {
        handle.disconnect().await;
        server.registry().remove(handle.id());
        return;
    }
    info!("{peer} connected");

    let mut lines = line_reader(read_half);

    loop {
        tokio::select! {
            next = lines.next_line() => match next {
                Ok(Some(line)) => {
                    debug!("message received from {peer}: {line}");
                    match Command::parse(&line) {
                        Command::Exit => break,
                        Command::Down => {
                            // Take the whole server down before leaving the
                            // loop; the line itself is never relayed.
                            info!("{peer} requested server shutdown");
                            server.shutdown().await;
                            break;
                        }
                        Command::Broadcast(text) => server.broadcaster().shout(text).await,
                    }
                }
                // Peer closed its end: implicit exit.
                Ok(None) => break,
                Err(e) => {
                    warn!("read error from {peer}, closing connection: {e}");
                    break;
                }
            },
            // Server-wide shutdown: stop reading.  The drain path closes the
            // stream; this arm only ends the loop.
            _ = shutdown_rx.recv() => break,
        }
    }

    handle.disconnect().await;
    server.registry().remove(handle.id());
    info!("{peer} disconnected");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// One real connected socket pair: (server side, client side).
    async fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted, connected) =
            tokio::join!(listener.accept(), TcpStream::connect(addr));
        (accepted.unwrap().0, connected.unwrap())
    }

    fn make_handle(server_side: TcpStream) -> (Arc<ConnectionHandle>, tokio::net::tcp::OwnedReadHalf) {
        let peer = server_side.peer_addr().unwrap();
        let (read_half, write_half) = server_side.into_split();
        (Arc::new(ConnectionHandle::new(peer, write_half)), read_half)
    }

    #[tokio::test]
    async fn test_send_line_reaches_the_peer() {
        // Arrange
        let (server_side, client_side) = socket_pair().await;
        let (handle, _server_read) = make_handle(server_side);
        let mut client_lines = line_reader(client_side);

        // Act
        handle.send_line("over the wire").await.unwrap();

        // Assert
        assert_eq!(
            client_lines.next_line().await.unwrap(),
            Some("over the wire".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_after_disconnect_reports_closed() {
        // Arrange
        let (server_side, _client_side) = socket_pair().await;
        let (handle, _server_read) = make_handle(server_side);

        // Act
        handle.disconnect().await;
        let result = handle.send_line("too late").await;

        // Assert
        assert!(matches!(result, Err(SendError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_a_noop() {
        let (server_side, _client_side) = socket_pair().await;
        let (handle, _server_read) = make_handle(server_side);

        handle.disconnect().await;
        // The second call must find the empty slot and return without fault.
        handle.disconnect().await;

        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_concurrent_disconnects_are_safe() {
        let (server_side, _client_side) = socket_pair().await;
        let (handle, _server_read) = make_handle(server_side);

        let a = Arc::clone(&handle);
        let b = Arc::clone(&handle);
        tokio::join!(a.disconnect(), b.disconnect());

        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_disconnect_signals_end_of_stream_to_the_peer() {
        // Arrange
        let (server_side, client_side) = socket_pair().await;
        let (handle, _server_read) = make_handle(server_side);
        let mut client_lines = line_reader(client_side);

        // Act
        handle.disconnect().await;

        // Assert – the peer's reader sees a clean end of stream.
        assert_eq!(client_lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_handle_starts_alive() {
        let (server_side, _client_side) = socket_pair().await;
        let (handle, _server_read) = make_handle(server_side);
        assert!(handle.is_alive());
    }
}
