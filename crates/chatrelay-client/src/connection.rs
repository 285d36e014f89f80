//! Network layer for the console client.
//!
//! Architecture:
//! - `ServerConnection` owns the TCP stream to the relay server.
//! - Inbound lines are forwarded on an `mpsc` channel as [`ClientEvent`]s.
//! - Outbound lines (the operator's typed input) are sent through the
//!   connection's shared write half.
//!
//! There is no reconnect loop: when the relay goes away the client reports
//! [`ClientEvent::Disconnected`] and is done – a downed server stays down
//! until someone starts a fresh one.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use chatrelay_core::{line_reader, write_line};

/// Errors that can occur in the client network layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connection to the relay server failed.
    #[error("failed to connect to server at {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the client's connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the relay server.
    pub server_addr: SocketAddr,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8090".parse().expect("valid literal address"),
        }
    }
}

/// Events emitted by the network layer to the console loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ClientEvent {
    /// The TCP connection was established.
    Connected { server_addr: SocketAddr },
    /// A line arrived from the server.
    LineReceived(String),
    /// The connection ended – server closed it, a read faulted, or the
    /// local side disconnected.
    Disconnected,
}

/// Manages the TCP connection from the console client to the relay server.
pub struct ServerConnection {
    config: ClientConfig,
    write_half: Mutex<Option<OwnedWriteHalf>>,
}

impl ServerConnection {
    /// Creates a new (not yet connected) `ServerConnection`.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            write_half: Mutex::new(None),
        }
    }

    /// Connects to the server and begins reading lines.
    ///
    /// Returns a channel receiver that delivers [`ClientEvent`]s to the
    /// caller; [`ClientEvent::Disconnected`] is always the final event.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectFailed`] when the TCP connection cannot
    /// be established.
    pub async fn start(self: Arc<Self>) -> Result<mpsc::Receiver<ClientEvent>, ClientError> {
        let addr = self.config.server_addr;
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::ConnectFailed { addr, source })?;
        info!("connected to relay server at {addr}");

        let (read_half, write_half) = stream.into_split();
        {
            let mut guard = self.write_half.lock().await;
            *guard = Some(write_half);
        }

        let (tx, rx) = mpsc::channel(128);
        let _ = tx.send(ClientEvent::Connected { server_addr: addr }).await;

        let this = Arc::clone(&self);
        tokio::spawn(async move {
            this.read_loop(read_half, &tx).await;
            this.disconnect().await;
            let _ = tx.send(ClientEvent::Disconnected).await;
        });

        Ok(rx)
    }

    /// Reads lines from the server and forwards them on `tx` until the
    /// stream ends or faults.
    async fn read_loop(&self, read_half: OwnedReadHalf, tx: &mpsc::Sender<ClientEvent>) {
        let mut lines = line_reader(read_half);
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(ClientEvent::LineReceived(line)).await.is_err() {
                        // Console loop is gone; nothing left to deliver to.
                        break;
                    }
                }
                Ok(None) => {
                    info!("server closed the connection");
                    break;
                }
                Err(e) => {
                    warn!("read error on server connection: {e}");
                    break;
                }
            }
        }
    }

    /// Sends one line to the server.
    ///
    /// A failure here is logged and swallowed: the read loop notices a dead
    /// connection on its own and emits [`ClientEvent::Disconnected`].
    pub async fn send_line(&self, line: &str) {
        let mut guard = self.write_half.lock().await;
        if let Some(ref mut writer) = *guard {
            if let Err(e) = write_line(writer, line).await {
                error!("failed to send line: {e}");
            }
        }
    }

    /// Closes the write half.  Idempotent: later calls find nothing to close.
    pub async fn disconnect(&self) {
        let taken = self.write_half.lock().await.take();
        if let Some(mut writer) = taken {
            if let Err(e) = writer.shutdown().await {
                debug!("closing connection: {e}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
