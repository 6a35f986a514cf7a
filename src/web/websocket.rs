//! WebSocket handler streaming dashboard snapshots.

use crate::sensor::DashboardSnapshot;
use crate::web::state::{AppState, ClientSlot};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, warn};

/// WebSocket upgrade handler; refuses connections over the configured limit.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let Some(slot) = state.try_acquire_client() else {
        warn!(
            max = state.config.max_websocket_connections,
            "WebSocket connection refused, limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "too many WebSocket connections").into_response();
    };

    let snapshots = state.snapshots.clone();
    ws.on_upgrade(move |socket| handle_websocket(socket, snapshots, slot))
}

async fn handle_websocket(socket: WebSocket, snapshots: watch::Receiver<DashboardSnapshot>, _slot: ClientSlot) {
    let client_id = uuid::Uuid::new_v4().to_string();
    info!("WebSocket client connected: {}", client_id);

    let (mut sender, mut receiver) = socket.split();

    let client_id_recv = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => debug!("Ignoring message from {}: {}", client_id_recv, text),
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error for client {}: {}", client_id_recv, e);
                    break;
                }
            }
        }
    });

    // Newest snapshot wins: a slow client skips intermediate ones.
    let client_id_send = client_id.clone();
    let mut send_task = tokio::spawn(async move {
        let mut updates = WatchStream::new(snapshots);
        while let Some(snapshot) = updates.next().await {
            let json = match serde_json::to_string(&snapshot) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize snapshot for client {}: {}", client_id_send, e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json)).await {
                debug!("Failed to send to client {}: {}", client_id_send, e);
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }

    info!("WebSocket client disconnected: {}", client_id);
}
