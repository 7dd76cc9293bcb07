use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::broker::ViewerId;

/// Represents a connected WebSocket viewer.
///
/// Each viewer is uniquely identified by an `id` and has a channel (`sender`)
/// feeding the connection's send loop.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for the viewer.
    pub id: ViewerId,

    /// Channel to send WebSocket messages to the viewer.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("viewer-{}", Uuid::new_v4()),
            sender,
        }
    }
}
