//! Best-effort delivery of one line to every registered connection.

use std::sync::Arc;

use tracing::debug;

use crate::application::registry::Registry;

/// Delivers lines to every connection in a registry snapshot.
///
/// Delivery is best-effort and unordered across recipients: a recipient
/// whose stream is already broken is skipped after a debug log, and delivery
/// to the remaining recipients continues.  The failing recipient is *not*
/// removed here – its own read loop observes the broken stream and
/// disconnects independently.
///
/// The snapshot contains the sender, so every client – including the author
/// of the line – receives it back.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Sends `line` to every connection currently in the registry.
    ///
    /// The snapshot is taken once, before the first send; connections that
    /// register mid-delivery catch the next line.
    pub async fn shout(&self, line: &str) {
        for sink in self.registry.snapshot() {
            if let Err(e) = sink.send_line(line).await {
                debug!("dropping line for connection {}: {e}", sink.id());
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
