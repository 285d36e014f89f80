//! Network infrastructure for the relay server.
//!
//! - **`handler`** – the per-connection state machine: one accepted socket,
//!   one Tokio task, one [`handler::ConnectionHandle`] registered for
//!   broadcast delivery.
//!
//! - **`listener`** – the accept loop and the server-wide shutdown
//!   protocol.

pub mod handler;
pub mod listener;

pub use handler::ConnectionHandle;
pub use listener::{RelayServer, ServerError};
