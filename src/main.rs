//! CLI for scorecast
//!
//! Subcommands:
//! - `server`: run the WebSocket server
//! - `probe`: fetch one topic once and report whether its upstream is healthy
//! - `client`: open many viewers against a running server (load smoke test)

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use scorecast::broker::{Broker, PollOptions, TopicResolver, TopicSelector};
use scorecast::client::{ViewerLoad, run_viewers};
use scorecast::config::{Settings, load_config};
use scorecast::provider::{HttpFetcher, probe};
use scorecast::transport::{Rooms, start_websocket_server};
use scorecast::utils::logging;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "scorecast")]
enum Command {
    /// Start the WebSocket server
    Server,
    /// Fetch a topic once, without starting a poller, and print a report
    Probe {
        #[arg(long, value_enum, default_value_t = SportArg::Cricket)]
        sport: SportArg,
        /// League display name (soccer only)
        #[arg(long)]
        league: Option<String>,
    },
    /// Open many viewers, subscribe them all to one topic and count updates
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:5000")]
        url: String,
        #[arg(long, value_enum, default_value_t = SportArg::Soccer)]
        sport: SportArg,
        /// League display name (soccer only)
        #[arg(long, default_value = "EPL")]
        league: String,
        /// Number of concurrent viewers
        #[arg(long, default_value_t = 60)]
        viewers: usize,
        /// Seconds each viewer stays subscribed
        #[arg(long, default_value_t = 30)]
        duration: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SportArg {
    Soccer,
    Cricket,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    logging::init(&config.log.level);

    let result = match cmd {
        Command::Server => run_server(config).await,
        Command::Probe { sport, league } => {
            let selector = match sport {
                SportArg::Soccer => TopicSelector::League(league),
                SportArg::Cricket => TopicSelector::Cricket,
            };
            run_probe(config, selector).await
        }
        Command::Client {
            url,
            sport,
            league,
            viewers,
            duration,
        } => {
            let selector = match sport {
                SportArg::Soccer => TopicSelector::league(league),
                SportArg::Cricket => TopicSelector::Cricket,
            };
            let load = ViewerLoad {
                url,
                selector,
                viewers,
                duration: Duration::from_secs(duration),
                stagger: Duration::from_millis(50),
            };
            run_client(load).await
        }
    };

    if let Err(e) = result {
        error!("scorecast failed: {e}");
        std::process::exit(1);
    }
}

async fn run_server(config: Settings) -> Result<(), Box<dyn std::error::Error>> {
    if config.cricket.api_key.is_empty() {
        warn!("No cricket API key configured (set CRICAPI_KEY); cricket fetches will fail");
    }

    let fetcher = Arc::new(HttpFetcher::new(&config.soccer, &config.cricket)?);
    let rooms = Arc::new(Rooms::new());
    let broker = Broker::new(
        TopicResolver::from_settings(&config.soccer),
        fetcher,
        rooms.clone(),
        PollOptions::from(&config.poller),
    );
    let addr = format!("{}:{}", config.server.host, config.server.port);

    tokio::select! {
        res = start_websocket_server(addr, broker.clone(), rooms) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    broker.shutdown();
    Ok(())
}

async fn run_probe(
    config: Settings,
    selector: TopicSelector,
) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = HttpFetcher::new(&config.soccer, &config.cricket)?;
    let key = TopicResolver::from_settings(&config.soccer).resolve(&selector);

    let report = probe(&fetcher, &key).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_client(load: ViewerLoad) -> Result<(), Box<dyn std::error::Error>> {
    info!(url = %load.url, viewers = load.viewers, "Spawning viewers");
    let report = run_viewers(&load).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.connected == 0 {
        return Err(format!("no viewer could connect to {}", load.url).into());
    }
    Ok(())
}
