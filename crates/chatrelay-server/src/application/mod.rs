//! Application layer for the relay server.
//!
//! This layer holds the relay's decision logic – who is connected, and who
//! a line gets delivered to.  It depends on the [`registry::LineSink`]
//! trait rather than on sockets, so all of it is unit-testable with
//! recording doubles.
//!
//! # Sub-modules
//!
//! - **`registry`** – the concurrency-safe membership set of live
//!   connections, and the `LineSink` seam the network layer implements.
//!
//! - **`broadcast`** – best-effort delivery of one line to every
//!   registered connection.

pub mod broadcast;
pub mod registry;
