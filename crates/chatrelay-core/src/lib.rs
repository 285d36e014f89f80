//! # chatrelay-core
//!
//! Shared library for chatrelay containing the newline-delimited line
//! protocol used by both the server and the console client.
//!
//! This crate owns no sockets and spawns no tasks – it only defines how
//! lines travel over an already-established byte stream and what the
//! control lines mean.
//!
//! # Protocol overview
//!
//! Chatrelay speaks a plain text protocol: one message per line, terminated
//! by `\n` (a trailing `\r` from Windows peers is accepted and stripped on
//! read).  Immediately after a connection is accepted the server greets it
//! with the literal line `Welcome!`.  After that, every line a client sends
//! is either one of two control commands (`exit`, `down`) or an ordinary
//! message that the server relays verbatim to every connected client.

// Declare the protocol module.  Rust will look for it in src/protocol/mod.rs.
pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `chatrelay_core::Command` instead of `chatrelay_core::protocol::command::Command`.
pub use protocol::command::{Command, DOWN_COMMAND, EXIT_COMMAND, WELCOME_LINE};
pub use protocol::line::{line_reader, write_line};
