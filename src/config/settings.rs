use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the server, the pollers, each upstream provider and
/// logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub poller: PollerSettings,
    pub soccer: SoccerSettings,
    pub cricket: CricketSettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the WebSocket server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration shared by every topic poller.
#[derive(Debug, Deserialize, Clone)]
pub struct PollerSettings {
    /// Pause between the end of one cycle and the start of the next.
    pub interval_secs: u64,
    /// Stop a poller once its topic has no viewers left.
    pub idle_shutdown: bool,
}

impl PollerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// ESPN soccer scoreboard provider.
#[derive(Debug, Deserialize, Clone)]
pub struct SoccerSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// League used when a subscription names no league or an unknown one.
    pub default_league: String,
    /// Display name -> ESPN league code.
    pub leagues: BTreeMap<String, String>,
}

/// CricAPI current matches provider.
#[derive(Debug, Deserialize, Clone)]
pub struct CricketSettings {
    pub url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub poller: Option<PartialPollerSettings>,
    pub soccer: Option<PartialSoccerSettings>,
    pub cricket: Option<PartialCricketSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialPollerSettings {
    pub interval_secs: Option<u64>,
    pub idle_shutdown: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialSoccerSettings {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub default_league: Option<String>,
    pub leagues: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct PartialCricketSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        let leagues = [
            ("EPL", "eng.1"),
            ("La Liga", "esp.1"),
            ("Serie A", "ita.1"),
            ("Bundesliga", "ger.1"),
            ("Ligue 1", "fra.1"),
            ("UCL", "uefa.champions"),
        ]
        .into_iter()
        .map(|(name, code)| (name.to_string(), code.to_string()))
        .collect();

        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            poller: PollerSettings {
                interval_secs: 10,
                idle_shutdown: false,
            },
            soccer: SoccerSettings {
                base_url: "https://site.api.espn.com/apis/site/v2/sports/soccer".to_string(),
                timeout_secs: 10,
                default_league: "EPL".to_string(),
                leagues,
            },
            cricket: CricketSettings {
                url: "https://api.cricapi.com/v1/currentMatches".to_string(),
                api_key: String::new(),
                timeout_secs: 12,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
