mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    CricketSettings, LogSettings, PollerSettings, ServerSettings, Settings, SoccerSettings,
};

/// Environment variable consulted when no cricket API key is configured.
pub const CRICAPI_KEY_VAR: &str = "CRICAPI_KEY";

/// Plain port variable set by most hosting platforms. `server.port` from the
/// file or `SCORECAST_SERVER__PORT` takes precedence.
pub const PORT_VAR: &str = "PORT";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing every section of the configuration
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("SCORECAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = merge(partial, Settings::default(), port_from_env()?);
    validate(&settings)?;
    Ok(settings)
}

fn port_from_env() -> Result<Option<u16>, ConfigError> {
    match std::env::var(PORT_VAR) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Message(format!("{PORT_VAR} must be a port number, got {raw:?}"))),
        _ => Ok(None),
    }
}

/// Rejects values that would make pollers spin or requests fail instantly.
fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let positive = [
        ("poller.interval_secs", settings.poller.interval_secs),
        ("soccer.timeout_secs", settings.soccer.timeout_secs),
        ("cricket.timeout_secs", settings.cricket.timeout_secs),
    ];
    for (name, value) in positive {
        if value == 0 {
            return Err(ConfigError::Message(format!("{name} must be at least 1")));
        }
    }
    Ok(())
}

fn merge(partial: PartialSettings, default: Settings, port_fallback: Option<u16>) -> Settings {
    let server = partial.server;
    let poller = partial.poller;
    let soccer = partial.soccer;
    let cricket = partial.cricket;
    let log = partial.log;

    let api_key = cricket
        .as_ref()
        .and_then(|c| c.api_key.clone())
        .filter(|key| !key.is_empty())
        .or_else(|| std::env::var(CRICAPI_KEY_VAR).ok())
        .unwrap_or(default.cricket.api_key);

    Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .or(port_fallback)
                .unwrap_or(default.server.port),
        },
        poller: PollerSettings {
            interval_secs: poller
                .as_ref()
                .and_then(|p| p.interval_secs)
                .unwrap_or(default.poller.interval_secs),
            idle_shutdown: poller
                .as_ref()
                .and_then(|p| p.idle_shutdown)
                .unwrap_or(default.poller.idle_shutdown),
        },
        soccer: SoccerSettings {
            base_url: soccer
                .as_ref()
                .and_then(|s| s.base_url.clone())
                .unwrap_or(default.soccer.base_url),
            timeout_secs: soccer
                .as_ref()
                .and_then(|s| s.timeout_secs)
                .unwrap_or(default.soccer.timeout_secs),
            default_league: soccer
                .as_ref()
                .and_then(|s| s.default_league.clone())
                .unwrap_or(default.soccer.default_league),
            leagues: soccer
                .as_ref()
                .and_then(|s| s.leagues.clone())
                .filter(|leagues| !leagues.is_empty())
                .unwrap_or(default.soccer.leagues),
        },
        cricket: CricketSettings {
            url: cricket
                .as_ref()
                .and_then(|c| c.url.clone())
                .unwrap_or(default.cricket.url),
            api_key,
            timeout_secs: cricket
                .as_ref()
                .and_then(|c| c.timeout_secs)
                .unwrap_or(default.cricket.timeout_secs),
        },
        log: LogSettings {
            level: log
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.log.level),
        },
    }
}
