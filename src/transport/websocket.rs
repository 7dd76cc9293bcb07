//! WebSocket transport
//!
//! This file implements the WebSocket server viewers connect to.
//! Responsibilities:
//! - Accept TCP/WebSocket connections
//! - Create a `Client` for each connection and register it with `Rooms`
//! - Forward queued frames to the socket from a dedicated send loop
//! - Translate subscribe/unsubscribe frames into broker calls
//! - Remove the viewer from every topic when the connection ends

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::{Broker, ViewerId};
use crate::client::Client;
use crate::transport::message::{Action, ClientMessage};
use crate::transport::rooms::Rooms;

pub async fn start_websocket_server(
    addr: String,
    broker: Broker,
    rooms: Arc<Rooms>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket server listening on ws://{addr}");
    serve(listener, broker, rooms).await
}

/// Accepts connections on an already bound listener until accepting fails.
pub async fn serve(listener: TcpListener, broker: Broker, rooms: Arc<Rooms>) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let broker = broker.clone();
        let rooms = rooms.clone();

        spawn(async move {
            info!(%peer, "Connection accepted");
            handle_connection(stream, broker, rooms).await;
        });
    }
}

async fn handle_connection(stream: TcpStream, broker: Broker, rooms: Arc<Rooms>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake error");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Register the viewer before reading anything from it
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let viewer = client.id.clone();
    rooms.register_client(client);

    {
        let viewer = viewer.clone();
        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    warn!(viewer = %viewer, error = %e, "Failed to send message");
                    break;
                }
            }
            info!(viewer = %viewer, "Send loop closed");
        });
    }

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        match msg.to_text() {
            Ok(text) => dispatch(&broker, &rooms, &viewer, text),
            Err(e) => warn!(viewer = %viewer, error = %e, "Unreadable text frame"),
        }
    }

    // Dropping the client's sender also ends the send loop
    let topics = rooms.remove_client(&viewer);
    info!(viewer = %viewer, topics, "Viewer disconnected");
}

/// Handles one text frame from `viewer`.
pub fn dispatch(broker: &Broker, rooms: &Rooms, viewer: &ViewerId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => match message.into_request() {
            (Action::Subscribe, selector) => {
                broker.subscribe(viewer, &selector);
            }
            (Action::Unsubscribe, selector) => {
                broker.unsubscribe(viewer, &selector);
            }
        },
        Err(err) => {
            warn!(
                viewer = %viewer,
                error = %err,
                frame = %text.chars().take(100).collect::<String>(),
                "Invalid client message"
            );
            rooms.send_error(viewer, format!("invalid message: {err}"));
        }
    }
}
