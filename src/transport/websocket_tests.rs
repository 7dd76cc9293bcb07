use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::broker::{Broker, PollOptions, TopicKey, TopicResolver};
use crate::config::Settings;
use crate::provider::Fetcher;
use crate::transport::message::ServerMessage;
use crate::transport::rooms::Rooms;
use crate::transport::websocket::serve;
use crate::utils::error::FetchError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct OneMatch;

#[async_trait]
impl Fetcher for OneMatch {
    async fn fetch(&self, _key: &TopicKey) -> Result<Value, FetchError> {
        Ok(json!({
            "events": [{
                "id": "9",
                "competitions": [{
                    "competitors": [
                        { "homeAway": "home", "team": { "displayName": "PSG" }, "score": "3" },
                        { "homeAway": "away", "team": { "displayName": "Lyon" }, "score": "0" }
                    ]
                }]
            }]
        }))
    }
}

async fn setup_server() -> (String, Broker, Arc<Rooms>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    let rooms = Arc::new(Rooms::new());
    let options = PollOptions {
        interval: Duration::from_secs(60),
        idle_shutdown: false,
    };
    let broker = Broker::new(
        TopicResolver::from_settings(&Settings::default().soccer),
        Arc::new(OneMatch),
        rooms.clone(),
        options,
    );

    tokio::spawn(serve(listener, broker.clone(), rooms.clone()));
    (format!("ws://{addr}/"), broker, rooms)
}

async fn connect(url: &str) -> Socket {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("WebSocket handshake failed");
    ws_stream
}

async fn send(ws: &mut Socket, frame: Value) {
    ws.send(WsMessage::text(frame.to_string()))
        .await
        .expect("Failed to send frame");
}

async fn receive(ws: &mut Socket) -> ServerMessage {
    let response = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("Timed out waiting for a frame")
        .expect("Did not receive response")
        .unwrap();
    let raw_data = response.into_data();
    serde_json::from_slice(&raw_data).unwrap_or_else(|e| {
        panic!("Failed to deserialize ServerMessage from '{raw_data:?}': {e}");
    })
}

#[tokio::test]
async fn test_subscribe_gets_placeholder_then_scores() {
    let (url, broker, _rooms) = setup_server().await;
    let mut ws = connect(&url).await;

    send(&mut ws, json!({ "type": "league:subscribe", "league": "Ligue 1" })).await;

    match receive(&mut ws).await {
        ServerMessage::LeagueUpdate(payload) => {
            assert_eq!(payload.id, "Ligue 1");
            assert!(payload.is_placeholder());
        }
        other => panic!("Expected a placeholder, got {other:?}"),
    }
    match receive(&mut ws).await {
        ServerMessage::LeagueUpdate(payload) => {
            assert_eq!(payload.matches[0].home_team, "PSG");
            assert!(payload.last_updated.is_some());
        }
        other => panic!("Expected a snapshot, got {other:?}"),
    }
    broker.shutdown();
}

#[tokio::test]
async fn test_second_viewer_gets_replay() {
    let (url, broker, _rooms) = setup_server().await;
    let mut first = connect(&url).await;
    send(&mut first, json!({ "type": "league:subscribe" })).await;
    receive(&mut first).await;
    receive(&mut first).await;

    let mut second = connect(&url).await;
    send(&mut second, json!({ "type": "league:subscribe", "league": "EPL" })).await;
    match receive(&mut second).await {
        ServerMessage::LeagueUpdate(payload) => {
            assert_eq!(payload.id, "EPL");
            assert!(!payload.is_placeholder());
        }
        other => panic!("Expected a replay, got {other:?}"),
    }
    assert_eq!(broker.pollers_launched(), 1);
    broker.shutdown();
}

#[tokio::test]
async fn test_invalid_frame_gets_error() {
    let (url, broker, _rooms) = setup_server().await;
    let mut ws = connect(&url).await;

    send(&mut ws, json!({ "type": "publish", "topic": "x" })).await;

    match receive(&mut ws).await {
        ServerMessage::Error { message } => assert!(message.starts_with("invalid message: ")),
        other => panic!("Expected Error, got {other:?}"),
    }
    assert_eq!(broker.active_pollers(), 0);
}

#[tokio::test]
async fn test_disconnect_removes_viewer() {
    let (url, broker, rooms) = setup_server().await;
    let mut ws = connect(&url).await;
    send(&mut ws, json!({ "type": "cricket:subscribe" })).await;
    receive(&mut ws).await;
    assert_eq!(rooms.client_count(), 1);

    ws.close(None).await.expect("Failed to close WebSocket");
    drop(ws);

    let key = broker.resolve(&crate::broker::TopicSelector::Cricket);
    for _ in 0..200 {
        if rooms.client_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(rooms.client_count(), 0);
    assert_eq!(crate::broker::Audience::member_count(rooms.as_ref(), &key), 0);
    broker.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_viewers_share_one_poller() {
    use crate::broker::TopicSelector;
    use crate::client::{ViewerLoad, run_viewers};

    let (url, broker, _rooms) = setup_server().await;
    let load = ViewerLoad {
        url,
        selector: TopicSelector::league("EPL"),
        viewers: 20,
        duration: Duration::from_millis(500),
        stagger: Duration::ZERO,
    };

    let report = run_viewers(&load).await;

    assert_eq!(report.connected, 20);
    assert_eq!(report.failed, 0);
    assert_eq!(report.errors, 0);
    // everyone sees the snapshot, by replay or by broadcast
    assert!(report.updates >= 20, "{report:?}");
    assert!(report.placeholders <= 20);
    assert_eq!(broker.pollers_launched(), 1);
    broker.shutdown();
}

#[tokio::test]
async fn test_viewer_load_on_cricket() {
    use crate::broker::TopicSelector;
    use crate::client::{ViewerLoad, run_viewers};

    let (url, broker, _rooms) = setup_server().await;
    let load = ViewerLoad {
        url,
        selector: TopicSelector::Cricket,
        viewers: 3,
        duration: Duration::from_millis(200),
        stagger: Duration::from_millis(10),
    };

    let report = run_viewers(&load).await;

    // the fixture has no cricket list, so only the placeholder arrives
    assert_eq!(report.connected, 3);
    assert_eq!(report.placeholders, 3);
    assert_eq!(report.updates, 0);
    assert_eq!(report.errors, 0);
    assert_eq!(broker.pollers_launched(), 1);
    broker.shutdown();
}
