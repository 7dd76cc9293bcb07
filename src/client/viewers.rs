//! Load client
//!
//! Opens many viewer connections against a running server, subscribes each
//! one to the same topic and counts the update frames they receive. With
//! one poller per topic, every viewer should see the same snapshots while
//! the upstream is fetched only once per interval.

use std::time::Duration;

use futures_util::future::join_all;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::json;
use tokio::time::{Instant, sleep, timeout_at};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::broker::TopicSelector;
use crate::transport::message::ServerMessage;

/// How many viewers to open and for how long.
#[derive(Debug, Clone)]
pub struct ViewerLoad {
    pub url: String,
    pub selector: TopicSelector,
    pub viewers: usize,
    /// How long each viewer stays subscribed.
    pub duration: Duration,
    /// Pause between opening two connections.
    pub stagger: Duration,
}

/// Totals over every viewer of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub connected: usize,
    pub failed: usize,
    /// Snapshot frames, replays included.
    pub updates: usize,
    pub placeholders: usize,
    pub errors: usize,
}

#[derive(Debug, Default)]
struct ViewerTally {
    updates: usize,
    placeholders: usize,
    errors: usize,
}

/// Runs `load` to completion and returns what the viewers saw.
pub async fn run_viewers(load: &ViewerLoad) -> LoadReport {
    let deadline = Instant::now() + load.stagger * load.viewers as u32 + load.duration;
    let subscribe = subscribe_frame(&load.selector).to_string();

    let mut tasks = Vec::with_capacity(load.viewers);
    for index in 0..load.viewers {
        let url = load.url.clone();
        let subscribe = subscribe.clone();
        tasks.push(tokio::spawn(async move {
            run_viewer(index, &url, subscribe, deadline).await
        }));
        if !load.stagger.is_zero() {
            sleep(load.stagger).await;
        }
    }

    let mut report = LoadReport::default();
    for outcome in join_all(tasks).await {
        match outcome {
            Ok(Some(tally)) => {
                report.connected += 1;
                report.updates += tally.updates;
                report.placeholders += tally.placeholders;
                report.errors += tally.errors;
            }
            Ok(None) => report.failed += 1,
            Err(e) => {
                warn!(error = %e, "Viewer task failed");
                report.failed += 1;
            }
        }
    }

    info!(
        connected = report.connected,
        failed = report.failed,
        updates = report.updates,
        "Viewer load finished"
    );
    report
}

fn subscribe_frame(selector: &TopicSelector) -> serde_json::Value {
    match selector {
        TopicSelector::League(Some(league)) => json!({ "type": "league:subscribe", "league": league }),
        TopicSelector::League(None) => json!({ "type": "league:subscribe" }),
        TopicSelector::Cricket => json!({ "type": "cricket:subscribe" }),
    }
}

/// `None` when the viewer never got subscribed.
async fn run_viewer(index: usize, url: &str, subscribe: String, deadline: Instant) -> Option<ViewerTally> {
    let (mut ws_stream, _response) = match connect_async(url).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(viewer = index, error = %e, "Failed to connect");
            return None;
        }
    };

    if let Err(e) = ws_stream.send(WsMessage::text(subscribe)).await {
        warn!(viewer = index, error = %e, "Failed to subscribe");
        return None;
    }

    let mut tally = ViewerTally::default();
    while let Ok(Some(Ok(msg))) = timeout_at(deadline, ws_stream.next()).await {
        let Ok(text) = msg.to_text() else {
            continue;
        };
        match serde_json::from_str::<ServerMessage>(text) {
            Ok(ServerMessage::LeagueUpdate(payload) | ServerMessage::CricketUpdate(payload)) => {
                if payload.is_placeholder() {
                    tally.placeholders += 1;
                } else {
                    tally.updates += 1;
                }
                if index < 2 {
                    debug!(viewer = index, matches = payload.matches.len(), "Received update");
                }
            }
            Ok(ServerMessage::Error { message }) => {
                warn!(viewer = index, %message, "Server rejected a frame");
                tally.errors += 1;
            }
            Err(_) => {}
        }
    }

    let _ = ws_stream.close(None).await;
    Some(tally)
}
