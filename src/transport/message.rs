use serde::{Deserialize, Serialize};

use crate::broker::{Sport, TopicSelector, UpdatePayload};

/// Frames accepted from viewers.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "league:subscribe")]
    LeagueSubscribe {
        #[serde(default)]
        league: Option<String>,
    },
    #[serde(rename = "league:unsubscribe")]
    LeagueUnsubscribe {
        #[serde(default)]
        league: Option<String>,
    },
    #[serde(rename = "cricket:subscribe")]
    CricketSubscribe {},
    #[serde(rename = "cricket:unsubscribe")]
    CricketUnsubscribe {},
}

/// Whether a client frame joins or leaves its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Subscribe,
    Unsubscribe,
}

impl ClientMessage {
    pub fn into_request(self) -> (Action, TopicSelector) {
        match self {
            ClientMessage::LeagueSubscribe { league } => {
                (Action::Subscribe, TopicSelector::League(league))
            }
            ClientMessage::LeagueUnsubscribe { league } => {
                (Action::Unsubscribe, TopicSelector::League(league))
            }
            ClientMessage::CricketSubscribe {} => (Action::Subscribe, TopicSelector::Cricket),
            ClientMessage::CricketUnsubscribe {} => (Action::Unsubscribe, TopicSelector::Cricket),
        }
    }
}

/// Frames pushed to viewers.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "league:update")]
    LeagueUpdate(UpdatePayload),
    #[serde(rename = "cricket:update")]
    CricketUpdate(UpdatePayload),
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn update(sport: Sport, payload: UpdatePayload) -> Self {
        match sport {
            Sport::Soccer => ServerMessage::LeagueUpdate(payload),
            Sport::Cricket => ServerMessage::CricketUpdate(payload),
        }
    }
}
