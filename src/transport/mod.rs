//! The `transport` module is responsible for network communication with
//! viewers via WebSockets.
//!
//! It defines the messaging protocol used between viewers and the server,
//! keeps topic membership for every connection, and implements the WebSocket
//! server itself, forwarding subscription requests to the broker.

pub mod message;
pub mod rooms;
pub mod websocket;

pub use message::{ClientMessage, ServerMessage};
pub use rooms::Rooms;
pub use websocket::start_websocket_server;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod websocket_tests;
