//! # scorecast
//!
//! `scorecast` pushes live sports scores to many WebSocket viewers while
//! polling each upstream feed only once. Viewers subscribe to a topic (a
//! soccer league or the cricket feed); the first subscription to a topic
//! starts its poller, later ones share it and get the cached snapshot
//! immediately.
//!
//! ## Core Modules
//!
//! - `broker`: topic keys, the poller registry, the snapshot cache, the
//!   poller loop and the subscribe/unsubscribe entry points.
//! - `client`: Represents a connected WebSocket viewer, plus a load client
//!   that opens many viewers against a running server.
//! - `config`: Handles loading and managing server configuration.
//! - `normalize`: Turns raw provider documents into normalized match state.
//! - `provider`: Fetches raw documents from the upstream HTTP providers.
//! - `transport`: Topic membership and the WebSocket server.
//! - `utils`: Shared utilities, such as error types and logging.

pub mod broker;
pub mod client;
pub mod config;
pub mod normalize;
pub mod provider;
pub mod transport;
pub mod utils;
