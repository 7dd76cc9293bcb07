use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::broker::snapshot::{MatchSnapshot, NormalizedState, Scorecard};
use crate::broker::topic::{Sport, TopicKey};

/// The payload pushed to viewers, both on every poll cycle and on replay.
///
/// This structure is used for serialization to JSON for communication over
/// WebSocket.
///
/// # Fields
///
/// - `id` - The topic id (league name or `cricket`).
/// - `matches` - Normalized match list, empty for the placeholder.
/// - `cards` - Cricket scorecards, absent for other sports.
/// - `last_updated` - Capture time of the snapshot in fractional Unix seconds.
/// - `info` - Only set on the "initial fetch in progress" placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub id: String,
    pub matches: Vec<MatchSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Scorecard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl UpdatePayload {
    pub fn snapshot(key: &TopicKey, state: &NormalizedState) -> Self {
        Self {
            id: key.room().to_string(),
            matches: state.matches.clone(),
            cards: state.cards.clone(),
            last_updated: Some(epoch_seconds(state.captured_at)),
            info: None,
        }
    }

    /// Sent to a viewer that joins a topic before its first successful fetch.
    pub fn placeholder(key: &TopicKey) -> Self {
        let info = match key.sport() {
            Sport::Soccer => "Fetching initial data...",
            Sport::Cricket => "Fetching initial cricket data...",
        };
        Self {
            id: key.room().to_string(),
            matches: Vec::new(),
            cards: None,
            last_updated: None,
            info: Some(info.to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.info.is_some()
    }
}

fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
