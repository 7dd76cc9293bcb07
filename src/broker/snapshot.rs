use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A score as shown to viewers: goals for soccer, an innings line such as
/// `"182/4 (20)"` for cricket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Goals(u32),
    Line(String),
}

/// Provider-independent state of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Score,
    pub away_score: Score,
    pub status: String,
    pub time: String,
}

/// Per-team line of a cricket scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCard {
    pub team: String,
    pub shortname: String,
    pub img: String,
    pub runs: Value,
    pub wickets: Value,
    pub overs: Value,
}

/// Cricket-only presentation data attached next to the match list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "matchType")]
    pub match_type: String,
    pub status: String,
    pub venue: String,
    pub teams: Vec<TeamCard>,
    pub raw_score_list: Vec<Value>,
}

/// Normalized result of one successful fetch. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedState {
    pub matches: Vec<MatchSnapshot>,
    pub cards: Option<Vec<Scorecard>>,
    pub captured_at: DateTime<Utc>,
}

impl NormalizedState {
    pub fn new(matches: Vec<MatchSnapshot>) -> Self {
        Self {
            matches,
            cards: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_cards(mut self, cards: Vec<Scorecard>) -> Self {
        self.cards = Some(cards);
        self
    }
}
