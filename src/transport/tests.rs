use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::{
    Audience, Broker, MatchSnapshot, NormalizedState, PollOptions, Score, Sport, TopicKey,
    TopicResolver, TopicSelector, UpdatePayload, ViewerId,
};
use crate::client::Client;
use crate::config::Settings;
use crate::provider::Fetcher;
use crate::transport::message::{Action, ClientMessage, ServerMessage};
use crate::transport::rooms::Rooms;
use crate::transport::websocket::dispatch;
use crate::utils::error::FetchError;

struct EmptyScoreboard;

#[async_trait]
impl Fetcher for EmptyScoreboard {
    async fn fetch(&self, _key: &TopicKey) -> Result<Value, FetchError> {
        Ok(json!({ "events": [], "data": [] }))
    }
}

fn resolver() -> TopicResolver {
    TopicResolver::from_settings(&Settings::default().soccer)
}

fn connect(rooms: &Rooms) -> (ViewerId, UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let id = client.id.clone();
    rooms.register_client(client);
    (id, rx)
}

fn frame(rx: &mut UnboundedReceiver<WsMessage>) -> Value {
    let msg = rx.try_recv().expect("expected a queued frame");
    serde_json::from_str(msg.to_text().unwrap()).unwrap()
}

fn sample_payload(key: &TopicKey) -> UpdatePayload {
    let state = NormalizedState::new(vec![MatchSnapshot {
        id: Some("1".to_string()),
        home_team: "Arsenal".to_string(),
        away_team: "Chelsea".to_string(),
        home_score: Score::Goals(2),
        away_score: Score::Goals(1),
        status: "Full Time".to_string(),
        time: "FT".to_string(),
    }]);
    UpdatePayload::snapshot(key, &state)
}

// ---------------------------------------------------------------------------
// wire format
// ---------------------------------------------------------------------------

#[test]
fn test_client_message_parsing() {
    let cases = [
        (
            json!({ "type": "league:subscribe", "league": "EPL" }),
            Action::Subscribe,
            TopicSelector::league("EPL"),
        ),
        (
            json!({ "type": "league:subscribe" }),
            Action::Subscribe,
            TopicSelector::League(None),
        ),
        (
            json!({ "type": "league:unsubscribe", "league": null }),
            Action::Unsubscribe,
            TopicSelector::League(None),
        ),
        (
            json!({ "type": "cricket:subscribe" }),
            Action::Subscribe,
            TopicSelector::Cricket,
        ),
        (
            json!({ "type": "cricket:unsubscribe", "extra": true }),
            Action::Unsubscribe,
            TopicSelector::Cricket,
        ),
    ];

    for (raw, action, selector) in cases {
        let msg: ClientMessage = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.into_request(), (action, selector), "frame {raw}");
    }
}

#[test]
fn test_client_message_rejects_unknown_frames() {
    for raw in [
        r#"{"type":"publish","topic":"x"}"#,
        r#"{"league":"EPL"}"#,
        r#"{"type":"league:subscribe","league":7}"#,
        "not json",
    ] {
        assert!(serde_json::from_str::<ClientMessage>(raw).is_err(), "frame {raw}");
    }
}

#[test]
fn test_update_frame_shape() {
    let key = resolver().resolve(&TopicSelector::league("EPL"));

    let placeholder = serde_json::to_value(ServerMessage::update(
        Sport::Soccer,
        UpdatePayload::placeholder(&key),
    ))
    .unwrap();
    assert_eq!(
        placeholder,
        json!({
            "type": "league:update",
            "id": "EPL",
            "matches": [],
            "info": "Fetching initial data..."
        })
    );

    let snapshot = serde_json::to_value(ServerMessage::update(Sport::Soccer, sample_payload(&key))).unwrap();
    assert_eq!(snapshot["type"], "league:update");
    assert!(snapshot["last_updated"].is_f64());
    assert!(snapshot.get("info").is_none());
    assert!(snapshot.get("cards").is_none());
    assert_eq!(
        snapshot["matches"][0],
        json!({
            "id": "1",
            "home_team": "Arsenal",
            "away_team": "Chelsea",
            "home_score": 2,
            "away_score": 1,
            "status": "Full Time",
            "time": "FT"
        })
    );
}

#[test]
fn test_cricket_and_error_frames() {
    let key = resolver().resolve(&TopicSelector::Cricket);
    let cricket = serde_json::to_value(ServerMessage::update(
        Sport::Cricket,
        UpdatePayload::placeholder(&key),
    ))
    .unwrap();
    assert_eq!(cricket["type"], "cricket:update");
    assert_eq!(cricket["id"], "cricket");

    let error = serde_json::to_value(ServerMessage::Error {
        message: "invalid message: boom".to_string(),
    })
    .unwrap();
    assert_eq!(error, json!({ "type": "error", "message": "invalid message: boom" }));
}

// ---------------------------------------------------------------------------
// rooms
// ---------------------------------------------------------------------------

#[test]
fn test_broadcast_reaches_each_member_once() {
    let rooms = Rooms::new();
    let key = resolver().resolve(&TopicSelector::league("EPL"));
    let (alice, mut alice_rx) = connect(&rooms);
    let (bob, mut bob_rx) = connect(&rooms);
    let (_carol, mut carol_rx) = connect(&rooms);

    rooms.join(&alice, &key);
    rooms.join(&bob, &key);
    rooms.join(&bob, &key);
    assert_eq!(rooms.member_count(&key), 2);

    rooms.broadcast(&key, &sample_payload(&key));

    assert_eq!(frame(&mut alice_rx)["matches"][0]["home_team"], "Arsenal");
    assert_eq!(frame(&mut bob_rx)["id"], "EPL");
    assert!(alice_rx.try_recv().is_err());
    assert!(bob_rx.try_recv().is_err());
    assert!(carol_rx.try_recv().is_err());
}

#[test]
fn test_send_to_targets_one_viewer() {
    let rooms = Rooms::new();
    let key = resolver().resolve(&TopicSelector::Cricket);
    let (alice, mut alice_rx) = connect(&rooms);
    let (bob, mut bob_rx) = connect(&rooms);
    rooms.join(&alice, &key);
    rooms.join(&bob, &key);

    rooms.send_to(&alice, &key, &UpdatePayload::placeholder(&key));

    assert_eq!(frame(&mut alice_rx)["type"], "cricket:update");
    assert!(bob_rx.try_recv().is_err());

    // an unknown viewer is logged, not fatal
    rooms.send_to(&"viewer-gone".to_string(), &key, &UpdatePayload::placeholder(&key));
}

#[test]
fn test_leave_drops_empty_rooms() {
    let rooms = Rooms::new();
    let key = resolver().resolve(&TopicSelector::league("UCL"));
    let (alice, _rx) = connect(&rooms);

    rooms.join(&alice, &key);
    assert!(rooms.is_member(&alice, &key));
    rooms.leave(&alice, &key);
    rooms.leave(&alice, &key);

    assert!(!rooms.is_member(&alice, &key));
    assert_eq!(rooms.member_count(&key), 0);
}

#[test]
fn test_remove_client_leaves_every_topic() {
    let rooms = Rooms::new();
    let resolver = resolver();
    let epl = resolver.resolve(&TopicSelector::league("EPL"));
    let cricket = resolver.resolve(&TopicSelector::Cricket);
    let (alice, _alice_rx) = connect(&rooms);
    let (bob, _bob_rx) = connect(&rooms);

    rooms.join(&alice, &epl);
    rooms.join(&alice, &cricket);
    rooms.join(&bob, &epl);

    assert_eq!(rooms.remove_client(&alice), 2);
    assert_eq!(rooms.client_count(), 1);
    assert_eq!(rooms.member_count(&epl), 1);
    assert_eq!(rooms.member_count(&cricket), 0);
    assert_eq!(rooms.remove_client(&alice), 0);
}

#[test]
fn test_send_error_frame() {
    let rooms = Rooms::new();
    let (alice, mut rx) = connect(&rooms);

    rooms.send_error(&alice, "invalid message: nope");

    assert_eq!(
        frame(&mut rx),
        json!({ "type": "error", "message": "invalid message: nope" })
    );
}

// ---------------------------------------------------------------------------
// dispatch
// ---------------------------------------------------------------------------

fn broker(rooms: &Arc<Rooms>) -> Broker {
    let options = PollOptions {
        interval: Duration::from_secs(60),
        idle_shutdown: false,
    };
    Broker::new(resolver(), Arc::new(EmptyScoreboard), rooms.clone(), options)
}

#[tokio::test]
async fn test_dispatch_subscribe_and_unsubscribe() {
    let rooms = Arc::new(Rooms::new());
    let broker = broker(&rooms);
    let (viewer, mut rx) = connect(&rooms);
    let key = broker.resolve(&TopicSelector::league("Bundesliga"));

    dispatch(&broker, &rooms, &viewer, r#"{"type":"league:subscribe","league":"Bundesliga"}"#);

    assert!(rooms.is_member(&viewer, &key));
    assert!(broker.is_polling(&key));
    let first = frame(&mut rx);
    assert_eq!(first["type"], "league:update");
    assert_eq!(first["id"], "Bundesliga");

    dispatch(&broker, &rooms, &viewer, r#"{"type":"league:unsubscribe","league":"Bundesliga"}"#);
    assert!(!rooms.is_member(&viewer, &key));
    broker.shutdown();
}

#[tokio::test]
async fn test_dispatch_cricket_subscribe() {
    let rooms = Arc::new(Rooms::new());
    let broker = broker(&rooms);
    let (viewer, mut rx) = connect(&rooms);

    dispatch(&broker, &rooms, &viewer, r#"{"type":"cricket:subscribe"}"#);

    let key = broker.resolve(&TopicSelector::Cricket);
    assert!(rooms.is_member(&viewer, &key));
    assert_eq!(frame(&mut rx)["info"], "Fetching initial cricket data...");
    broker.shutdown();
}

#[tokio::test]
async fn test_dispatch_invalid_frame_replies_with_error() {
    let rooms = Arc::new(Rooms::new());
    let broker = broker(&rooms);
    let (viewer, mut rx) = connect(&rooms);

    dispatch(&broker, &rooms, &viewer, r#"{"type":"publish"}"#);
    dispatch(&broker, &rooms, &viewer, "{{{");

    for _ in 0..2 {
        let reply = frame(&mut rx);
        assert_eq!(reply["type"], "error");
        assert!(reply["message"].as_str().unwrap().starts_with("invalid message: "));
    }
    assert_eq!(broker.active_pollers(), 0);
}
