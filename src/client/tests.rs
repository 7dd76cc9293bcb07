use super::pubsub_client::Client;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

#[test]
fn test_client_new() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    assert!(client.id.starts_with("viewer-"));
}

#[test]
fn test_client_ids_are_unique() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let a = Client::new(tx.clone());
    let b = Client::new(tx);
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_viewer_load_against_closed_port() {
    use crate::broker::TopicSelector;
    use crate::client::{LoadReport, ViewerLoad, run_viewers};
    use std::time::Duration;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/", listener.local_addr().unwrap());
    drop(listener);

    let load = ViewerLoad {
        url,
        selector: TopicSelector::League(None),
        viewers: 3,
        duration: Duration::from_millis(50),
        stagger: Duration::ZERO,
    };

    assert_eq!(
        run_viewers(&load).await,
        LoadReport {
            failed: 3,
            ..LoadReport::default()
        }
    );
}
