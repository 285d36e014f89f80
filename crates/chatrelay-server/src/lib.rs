//! chatrelay-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in the CLI crate share the same module tree.
//!
//! # What does the server do?
//!
//! The relay server accepts TCP connections, greets each one with
//! `Welcome!`, and then relays every ordinary line a client sends to every
//! connected client.  Two control lines steer the lifecycle: `exit`
//! disconnects only the sender, `down` disconnects everyone and stops the
//! server.  Each connection runs on its own Tokio task; the only state
//! shared between tasks is the connection registry.

/// Application layer: registry and broadcast logic, socket-free.
pub mod application;

/// Infrastructure layer: TCP sockets and configuration files.
pub mod infrastructure;

pub use application::broadcast::Broadcaster;
pub use application::registry::{ConnectionId, LineSink, Registry, SendError};
pub use infrastructure::config::{
    load_config, save_config, AppConfig, ConfigError, NetworkConfig, ServerSection,
};
pub use infrastructure::network::listener::{RelayServer, ServerError};
