//! chatrelay-client library entry point.
//!
//! Re-exports all public modules so that tests and the binary entry point
//! in the CLI crate share the same module tree.
//!
//! # What does the client do?
//!
//! The console client is the human side of the relay: it connects to the
//! server, forwards every line the operator types on standard input, and
//! prints every line the server relays back – including the operator's own
//! lines, which the server echoes to everyone in the room.

/// TCP connection to the relay server.
pub mod connection;

/// The operator console loop: stdin → server, server → stdout.
pub mod console;

pub use connection::{ClientConfig, ClientError, ClientEvent, ServerConnection};
pub use console::run_console;
