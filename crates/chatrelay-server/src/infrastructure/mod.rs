//! Infrastructure layer for the relay server.
//!
//! Contains the pieces that touch the outside world: TCP sockets and the
//! configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `chatrelay_core`, but MUST NOT be imported by the `application` layer.

pub mod config;
pub mod network;
