//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{ArenaEvent, ArenaHandle, PlayerId};
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Socket-level failures
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("WebSocket send failed: {0}")]
    Send(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    // The connection id is the player's identity for its whole lifetime
    let player_id = Uuid::new_v4();
    info!(player_id = %player_id, "Player connected");

    let (ws_sink, ws_stream) = socket.split();
    let outbound_rx = state.connections.register(player_id);

    run_session(player_id, ws_sink, ws_stream, &state.arena, outbound_rx).await;

    // Cleanup on disconnect
    if !state
        .arena
        .send(ArenaEvent::Disconnected { player_id })
        .await
    {
        warn!(player_id = %player_id, "Arena unavailable during disconnect");
    }
    state.connections.unregister(&player_id);

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    player_id: PlayerId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    arena: &ArenaHandle,
    mut outbound_rx: mpsc::Receiver<ServerMsg>,
) {
    // Spawn writer task: outbound queue -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> arena
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(msg) => {
                    if !arena.send(ArenaEvent::Client { player_id, msg }).await {
                        debug!(player_id = %player_id, "Arena channel closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), WsError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
