//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use sabun_shared::time::get_jst_timestamp;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientId, ClientIdFactory},
    infrastructure::dto::websocket::{ClientEvent, ServerEvent},
    ui::{
        handler::dispatch::{dispatch, handle_disconnect},
        state::{AppState, ClientInfo},
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let client_id = ClientIdFactory::generate();
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this client to receive messages
    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let mut clients = state.connected_clients.lock().await;
        clients.insert(
            client_id.clone(),
            ClientInfo {
                sender: tx,
                connected_at: get_jst_timestamp(),
                name: None,
            },
        );
    }
    tracing::info!("Client '{}' connected", client_id);

    // Tell the client who it is
    state
        .send_to(
            &client_id,
            &ServerEvent::ClientId {
                client_id: client_id.to_string(),
            },
        )
        .await;

    let client_id_clone = client_id.clone();
    let state_clone = state.clone();

    // Spawn a task to receive events from this client, one at a time
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error from '{}': {}", client_id_clone, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_text(&state_clone, &client_id_clone, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", client_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward outbound events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    handle_disconnect(&state, &client_id).await;
    state.connected_clients.lock().await.remove(&client_id);
    tracing::info!("Client '{}' disconnected", client_id);
}

async fn handle_text(state: &Arc<AppState>, client_id: &ClientId, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => {
            tracing::debug!("Event from '{}': {:?}", client_id, event);
            dispatch(state, client_id, event).await;
        }
        Err(e) => {
            tracing::warn!("Failed to parse event from '{}': {}", client_id, e);
            state
                .send_to(client_id, &ServerEvent::error(format!("invalid event: {e}")))
                .await;
        }
    }
}
