use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SoccerSettings;

/// League code used when neither the requested nor the default league is
/// configured.
const FALLBACK_LEAGUE_CODE: &str = "eng.1";

/// Room and key of the single cricket feed.
const CRICKET_TOPIC: &str = "cricket";

/// Sports with an upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Soccer,
    Cricket,
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sport::Soccer => f.write_str("soccer"),
            Sport::Cricket => f.write_str(CRICKET_TOPIC),
        }
    }
}

/// Canonical identifier of one upstream feed and the unit of poll
/// deduplication.
///
/// Keys are only built by [`TopicResolver`]; two keys are equal exactly when
/// they must share a poller and a cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicKey {
    sport: Sport,
    room: String,
    feed: String,
}

impl TopicKey {
    fn soccer(room: &str, league_code: &str) -> Self {
        Self {
            sport: Sport::Soccer,
            room: room.to_string(),
            feed: league_code.to_string(),
        }
    }

    fn cricket() -> Self {
        Self {
            sport: Sport::Cricket,
            room: CRICKET_TOPIC.to_string(),
            feed: CRICKET_TOPIC.to_string(),
        }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    /// Topic id shown to viewers: the league name, or `cricket`.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Provider-side feed identifier (the ESPN league code for soccer).
    pub fn feed(&self) -> &str {
        &self.feed
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sport {
            Sport::Soccer => write!(f, "soccer:{}:{}", self.room, self.feed),
            Sport::Cricket => f.write_str(CRICKET_TOPIC),
        }
    }
}

/// What a viewer asked to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicSelector {
    /// A soccer league by display name; `None` selects the default league.
    League(Option<String>),
    Cricket,
}

impl TopicSelector {
    pub fn league(name: impl Into<String>) -> Self {
        TopicSelector::League(Some(name.into()))
    }
}

/// Maps subscription requests onto canonical [`TopicKey`]s.
///
/// Resolution is total: an unknown or missing league resolves to the
/// configured default league, so every request gets a topic.
#[derive(Debug, Clone)]
pub struct TopicResolver {
    leagues: BTreeMap<String, String>,
    default_league: String,
}

impl TopicResolver {
    pub fn new(leagues: BTreeMap<String, String>, default_league: impl Into<String>) -> Self {
        Self {
            leagues,
            default_league: default_league.into(),
        }
    }

    pub fn from_settings(settings: &SoccerSettings) -> Self {
        Self::new(settings.leagues.clone(), settings.default_league.clone())
    }

    pub fn resolve(&self, selector: &TopicSelector) -> TopicKey {
        match selector {
            TopicSelector::Cricket => TopicKey::cricket(),
            TopicSelector::League(name) => {
                let (room, code) = name
                    .as_deref()
                    .and_then(|name| self.lookup(name))
                    .unwrap_or_else(|| self.default_league());
                TopicKey::soccer(room, code)
            }
        }
    }

    /// Configured league display names.
    pub fn league_names(&self) -> impl Iterator<Item = &str> {
        self.leagues.keys().map(String::as_str)
    }

    /// Exact match first, then a case-insensitive one. The configured
    /// spelling is returned so that every spelling lands in the same room.
    fn lookup(&self, name: &str) -> Option<(&str, &str)> {
        let name = name.trim();
        if let Some((room, code)) = self.leagues.get_key_value(name) {
            return Some((room.as_str(), code.as_str()));
        }
        self.leagues
            .iter()
            .find(|(room, _)| room.eq_ignore_ascii_case(name))
            .map(|(room, code)| (room.as_str(), code.as_str()))
    }

    fn default_league(&self) -> (&str, &str) {
        self.lookup(&self.default_league)
            .or_else(|| {
                self.leagues
                    .iter()
                    .next()
                    .map(|(room, code)| (room.as_str(), code.as_str()))
            })
            .unwrap_or((self.default_league.as_str(), FALLBACK_LEAGUE_CODE))
    }
}
