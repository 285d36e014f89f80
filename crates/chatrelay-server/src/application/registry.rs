//! The connection registry and the sink seam between relay logic and sockets.
//!
//! The `Registry` is the only state in the server that more than one task
//! mutates: the accept path inserts, a disconnecting handler removes itself,
//! and the shutdown path drains everything.  All of that goes through a
//! single mutual-exclusion domain.  Every operation acquires the lock,
//! mutates or clones, and releases – nothing ever performs I/O or awaits
//! while holding it.  Broadcast callers take an `Arc` snapshot out and send
//! entirely outside the locked region.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for one accepted connection.
pub type ConnectionId = Uuid;

/// Error returned when a line cannot be delivered to one recipient.
#[derive(Debug, Error)]
pub enum SendError {
    /// The connection's write half was already closed by `disconnect`.
    #[error("connection already closed")]
    ConnectionClosed,

    /// The write or flush failed at the socket level.
    #[error("send failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A recipient that lines can be delivered to.
///
/// The network layer implements this for real socket-backed connections;
/// tests implement it with recording doubles.  A send failure is strictly
/// per-recipient: the caller must keep delivering to everyone else, and must
/// not remove the failing recipient – its own read loop discovers the broken
/// stream and disconnects independently.
#[async_trait]
pub trait LineSink: Send + Sync {
    /// Identity of this connection inside the registry.
    fn id(&self) -> ConnectionId;

    /// Delivers one line to this connection, flushing immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] when the stream is closed or the write faults.
    async fn send_line(&self, line: &str) -> Result<(), SendError>;

    /// Tears the connection down.  Idempotent: the first call closes the
    /// stream, every later call is a no-op.
    async fn disconnect(&self);
}

/// Membership set of live connections.
///
/// Keyed by [`ConnectionId`] so removal is idempotent by construction: the
/// shutdown drain and a handler's self-removal can race, and whichever runs
/// second finds nothing to remove.
#[derive(Default)]
pub struct Registry {
    connections: Mutex<HashMap<ConnectionId, Arc<dyn LineSink>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the membership lock, absorbing poisoning: a panicking task
    /// must not wedge membership updates for everyone else.
    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<dyn LineSink>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a connection.  Re-inserting an id replaces the entry, which
    /// callers never rely on – each accepted socket registers once.
    pub fn add(&self, sink: Arc<dyn LineSink>) {
        self.lock().insert(sink.id(), sink);
    }

    /// Removes a connection if present; a no-op when absent.
    ///
    /// Returns whether an entry was actually removed, so callers that must
    /// act exactly once (none today) could tell the races apart.
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Membership snapshot, consistent at a single instant.
    ///
    /// Entries may disconnect while the caller iterates the snapshot; sends
    /// to those fail and the caller is expected to swallow the failure.
    pub fn snapshot(&self) -> Vec<Arc<dyn LineSink>> {
        self.lock().values().cloned().collect()
    }

    /// Atomically empties the registry, handing every removed connection to
    /// the caller exactly once.
    ///
    /// Shutdown uses this so each live connection is disconnected exactly
    /// once even while handlers are concurrently removing themselves.
    pub fn drain(&self) -> Vec<Arc<dyn LineSink>> {
        self.lock().drain().map(|(_, sink)| sink).collect()
    }

    /// Number of currently registered connections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
