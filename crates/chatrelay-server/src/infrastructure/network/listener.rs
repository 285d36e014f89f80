//! Accept loop and the server-wide shutdown protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::application::broadcast::Broadcaster;
use crate::application::registry::Registry;
use crate::infrastructure::config::NetworkConfig;
use crate::infrastructure::network::handler;

/// Error type for the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept call itself faulted.  Individual connection failures never
    /// surface here – only a fault of the listener.
    #[error("accept failed: {source}")]
    Accept {
        #[source]
        source: std::io::Error,
    },
}

/// The relay server: accept loop, registry, broadcaster, and shutdown.
///
/// Held in an `Arc` so every connection's task can reach [`shutdown`]
/// (the `down` command) and the broadcaster.
///
/// [`shutdown`]: RelayServer::shutdown
pub struct RelayServer {
    config: NetworkConfig,
    registry: Arc<Registry>,
    broadcaster: Broadcaster,
    /// Guards the accept loop and re-entrant shutdown; flips true→false
    /// exactly once per server lifetime.
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayServer {
    pub fn new(config: NetworkConfig) -> Arc<Self> {
        let registry = Arc::new(Registry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let (shutdown_tx, _) = broadcast::channel(1);
        Arc::new(Self {
            config,
            registry,
            broadcaster,
            running: AtomicBool::new(true),
            shutdown_tx,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Whether the server is still accepting and relaying.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A fresh receiver for the shutdown signal.  Every connection loop and
    /// the accept loop race their blocking reads against one of these.
    pub(crate) fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Binds the configured address and runs the accept loop until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] when the configured address
    /// cannot be bound, and [`ServerError::Accept`] when the accept loop
    /// faults (after triggering shutdown).
    pub async fn serve(self: Arc<Self>) -> Result<(), ServerError> {
        let addr = self.config.listen_addr();
        let listener =
            TcpListener::bind(&addr)
                .await
                .map_err(|source| ServerError::BindFailed {
                    addr: addr.clone(),
                    source,
                })?;
        info!("relay server listening on {addr}");
        self.serve_on(listener).await
    }

    /// Runs the accept loop over a pre-bound listener.
    ///
    /// Exposed separately so tests and embedders can bind port 0 themselves
    /// and learn the real address before the loop starts.
    ///
    /// Each accepted connection runs on its own task; the loop never waits
    /// on anything a new connection does.  When the loop returns the
    /// listener is dropped, which releases the port – close errors cannot
    /// surface and are irrelevant here.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Accept`] when accept itself faults.
    pub async fn serve_on(self: Arc<Self>, listener: TcpListener) -> Result<(), ServerError> {
        let mut shutdown_rx = self.subscribe_shutdown();
        if !self.is_running() {
            // Shut down before the loop ever started.
            return Ok(());
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if self.at_capacity() {
                            warn!("connection limit reached, refusing {peer}");
                            drop(stream);
                            continue;
                        }
                        let server = Arc::clone(&self);
                        tokio::spawn(handler::run_connection(server, stream, peer));
                    }
                    Err(source) => {
                        // A fault on accept is fatal to the listener, not to
                        // any one connection.
                        error!("accept failed, shutting down: {source}");
                        self.shutdown().await;
                        return Err(ServerError::Accept { source });
                    }
                },
                _ = shutdown_rx.recv() => {
                    info!("accept loop stopping");
                    return Ok(());
                }
            }
        }
    }

    fn at_capacity(&self) -> bool {
        match self.config.max_connections {
            Some(cap) => self.registry.len() >= cap,
            None => false,
        }
    }

    /// Disconnects every client and stops the accept loop.
    ///
    /// Idempotent under concurrent invocation: the first caller flips the
    /// running flag and performs the whole teardown; every other caller
    /// returns immediately.  Safe to call from any connection's task – the
    /// `down` command does – because the registry drain hands each handle
    /// out exactly once and a handler racing to disconnect itself sees a
    /// no-op rather than a deadlock.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("server shutting down");

        // Wake the accept loop and every read blocked in a connection loop.
        // Send errors just mean nobody is listening yet.
        let _ = self.shutdown_tx.send(());

        for sink in self.registry.drain() {
            sink.disconnect().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
