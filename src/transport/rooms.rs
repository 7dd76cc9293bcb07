use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::{Audience, TopicKey, UpdatePayload, ViewerId};
use crate::client::Client;
use crate::transport::message::ServerMessage;

/// Members of one topic.
#[derive(Debug)]
pub struct Room {
    pub key: TopicKey,
    pub members: HashSet<ViewerId>,
}

impl Room {
    pub fn new(key: &TopicKey) -> Self {
        Self {
            key: key.clone(),
            members: HashSet::new(),
        }
    }
}

#[derive(Debug, Default)]
struct RoomState {
    rooms: HashMap<TopicKey, Room>,
    clients: HashMap<ViewerId, Client>,
}

/// Connected viewers and the topics they are members of.
///
/// This is the WebSocket side of the broker's [`Audience`]: it keeps the
/// sending half of every connection and delivers serialized
/// [`ServerMessage`]s to the members of a topic. A single mutex guards both
/// maps; nothing awaits while it is held.
#[derive(Debug, Default)]
pub struct Rooms {
    state: Mutex<RoomState>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection.
    pub fn register_client(&self, client: Client) {
        let mut state = self.lock();
        state.clients.insert(client.id.clone(), client);
    }

    /// Drops a connection and removes it from every topic.
    ///
    /// Returns the number of topics the viewer was still a member of.
    pub fn remove_client(&self, viewer: &ViewerId) -> usize {
        let mut state = self.lock();
        state.clients.remove(viewer);

        let mut left = 0;
        state.rooms.retain(|key, room| {
            if room.members.remove(viewer) {
                left += 1;
                debug!(viewer = %viewer, topic = %key, "Removed viewer from topic");
            }
            !room.members.is_empty()
        });
        left
    }

    pub fn client_count(&self) -> usize {
        self.lock().clients.len()
    }

    pub fn is_member(&self, viewer: &ViewerId, topic: &TopicKey) -> bool {
        self.lock()
            .rooms
            .get(topic)
            .is_some_and(|room| room.members.contains(viewer))
    }

    /// Tells a viewer its last frame could not be handled.
    pub fn send_error(&self, viewer: &ViewerId, message: impl Into<String>) {
        let frame = ServerMessage::Error {
            message: message.into(),
        };
        if let Some(ws_msg) = encode(&frame) {
            self.lock().deliver(viewer, ws_msg);
        }
    }

    fn lock(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoomState {
    fn deliver(&self, viewer: &ViewerId, ws_msg: WsMessage) {
        match self.clients.get(viewer) {
            Some(client) => {
                if let Err(e) = client.sender.send(ws_msg) {
                    warn!(viewer = %viewer, error = %e, "Failed to queue message");
                }
            }
            None => warn!(viewer = %viewer, "No client registered with this id"),
        }
    }
}

impl Audience for Rooms {
    fn join(&self, viewer: &ViewerId, topic: &TopicKey) {
        let mut state = self.lock();
        state
            .rooms
            .entry(topic.clone())
            .or_insert_with(|| Room::new(topic))
            .members
            .insert(viewer.clone());
    }

    fn leave(&self, viewer: &ViewerId, topic: &TopicKey) {
        let mut state = self.lock();
        if let Some(room) = state.rooms.get_mut(topic) {
            room.members.remove(viewer);
            if room.members.is_empty() {
                state.rooms.remove(topic);
            }
        }
    }

    fn broadcast(&self, topic: &TopicKey, payload: &UpdatePayload) {
        let Some(ws_msg) = encode(&ServerMessage::update(topic.sport(), payload.clone())) else {
            return;
        };

        let state = self.lock();
        match state.rooms.get(topic) {
            Some(room) => {
                for viewer in &room.members {
                    state.deliver(viewer, ws_msg.clone());
                }
            }
            None => debug!(topic = %topic, "No viewers for topic"),
        }
    }

    fn send_to(&self, viewer: &ViewerId, topic: &TopicKey, payload: &UpdatePayload) {
        if let Some(ws_msg) = encode(&ServerMessage::update(topic.sport(), payload.clone())) {
            self.lock().deliver(viewer, ws_msg);
        }
    }

    fn member_count(&self, topic: &TopicKey) -> usize {
        self.lock()
            .rooms
            .get(topic)
            .map_or(0, |room| room.members.len())
    }
}

fn encode(frame: &ServerMessage) -> Option<WsMessage> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(WsMessage::text(json)),
        Err(e) => {
            error!(error = %e, "Failed to serialize message");
            None
        }
    }
}
