//! The `client` module defines the representation of a viewer connection.
//!
//! It provides the `Client` struct, which encapsulates the state of a single
//! connected viewer, including its unique identifier and the channel for
//! sending messages to it. `viewers` is the other side of the socket: a load
//! client that opens many viewers against a running server.

pub mod pubsub_client;
pub mod viewers;

pub use pubsub_client::Client;
pub use viewers::{LoadReport, ViewerLoad, run_viewers};

#[cfg(test)]
mod tests;
