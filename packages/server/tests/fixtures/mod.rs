//! Test fixtures: an in-process server and a WebSocket test client.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use sabun_server::{
    domain::{Coordinate, DifferenceRegion, DifferenceSnapshot, GameConstants, GameId},
    infrastructure::repository::InMemoryDifferenceRepository,
    ui::{build_router, state::AppState},
};
use serde_json::Value;
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// Pixels of the three differences every fixture game shares
pub const DIFFERENCES: [(u32, u32); 3] = [(100, 100), (300, 200), (500, 400)];

fn fixture_snapshot() -> DifferenceSnapshot {
    DifferenceSnapshot::new(vec![
        DifferenceRegion::new(vec![Coordinate::new(100, 100), Coordinate::new(101, 100)]),
        DifferenceRegion::new(vec![Coordinate::new(300, 200)]),
        DifferenceRegion::new(vec![Coordinate::new(500, 400)]),
    ])
}

/// Server bound to an ephemeral port, stopped on drop
pub struct TestServer {
    addr: SocketAddr,
    pub state: Arc<AppState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(GameConstants::default()).await
    }

    pub async fn start_with(constants: GameConstants) -> Self {
        let games = ["cats", "dogs"].map(|id| {
            (
                GameId::new(id.to_string()).expect("valid game id"),
                fixture_snapshot(),
            )
        });
        let differences = Arc::new(InMemoryDifferenceRepository::with_games(games));
        let state = Arc::new(AppState::new(differences, constants));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let app = build_router(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// WebSocket client speaking the game protocol
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub client_id: String,
}

impl TestClient {
    /// Connect and read the `client-id` greeting.
    pub async fn connect(server: &TestServer) -> Self {
        let (stream, _) = connect_async(server.ws_url())
            .await
            .expect("Failed to connect");
        let mut client = Self {
            stream,
            client_id: String::new(),
        };
        let hello = client.recv_type("client-id").await;
        client.client_id = hello["clientId"]
            .as_str()
            .expect("clientId is a string")
            .to_string();
        client
    }

    pub async fn send(&mut self, event: Value) {
        self.stream
            .send(Message::Text(event.to_string().into()))
            .await
            .expect("Failed to send");
    }

    /// Next JSON event, failing after 5 seconds.
    pub async fn recv(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), self.stream.next())
                .await
                .expect("Timed out waiting for an event")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("Server sent invalid JSON");
            }
        }
    }

    /// Next event of type `kind`, skipping anything else (clock ticks, notices).
    pub async fn recv_type(&mut self, kind: &str) -> Value {
        loop {
            let event = self.recv().await;
            if event["type"] == kind {
                return event;
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
