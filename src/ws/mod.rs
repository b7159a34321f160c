pub mod admin;
pub mod handlers;
pub mod host;
pub mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::error::PollError;
use crate::protocol::{ClientMessage, RoomBroadcast, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::{Role, RoomId, RoomInfo};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub room: Option<String>,
    pub role: Option<String>,
    pub passkey: Option<String>,
}

/// Who is on the other end of a socket
#[derive(Debug, Clone)]
pub struct Connection {
    pub role: Role,
    pub room_id: RoomId,
}

/// Resolve the role and room of a connection request.
/// Host and admin sockets must present the room passkey.
pub async fn authorize(state: &AppState, params: &WsQuery) -> Result<(Connection, RoomInfo), PollError> {
    let room_id = params
        .room
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| PollError::InvalidInput("Missing room".to_string()))?;

    let role = match params.role.as_deref() {
        Some("host") => Role::Host,
        Some("admin") => Role::Admin,
        _ => Role::Player,
    };

    let room = if role.is_owner() {
        let passkey = params.passkey.as_deref().unwrap_or_default();
        RoomInfo::from(&state.verify_passkey(room_id, passkey).await?)
    } else {
        state
            .get_room_info(room_id)
            .await
            .ok_or(PollError::RoomNotFound)?
    };

    Ok((
        Connection {
            role,
            room_id: room.id.clone(),
        },
        room,
    ))
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: room={:?}, role={:?}",
        params.room,
        params.role
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

fn to_text(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            None
        }
    }
}

/// Pick the messages meant for this room out of a broadcast receive
fn for_room(received: Result<RoomBroadcast, RecvError>, room_id: &str) -> Option<ServerMessage> {
    match received {
        Ok(b) if b.room_id == room_id => Some(b.msg),
        Ok(_) => None,
        Err(RecvError::Lagged(n)) => {
            tracing::warn!("Socket in room {} lagged by {} messages", room_id, n);
            None
        }
        Err(RecvError::Closed) => None,
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (conn, room) = match authorize(&state, &params).await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("Rejected WebSocket connection: {}", e);
            if let Some(msg) = to_text(&ServerMessage::from(e)) {
                let _ = sender.send(msg).await;
            }
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    tracing::info!("WebSocket connected: {:?} in room {}", conn.role, conn.room_id);

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role: conn.role,
        room,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if let Some(msg) = to_text(&welcome) {
        if sender.send(msg).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    // Subscribe to room broadcast (all clients)
    let mut broadcast_rx = state.broadcast.subscribe();

    // Subscribe to owner broadcast if Host or Admin
    let mut owner_rx = if conn.role.is_owner() {
        Some(state.owner_broadcast.subscribe())
    } else {
        None
    };

    loop {
        let outgoing = tokio::select! {
            received = broadcast_rx.recv() => {
                if matches!(received, Err(RecvError::Closed)) {
                    break;
                }
                for_room(received, &conn.room_id)
            }

            received = async {
                match &mut owner_rx {
                    Some(rx) => rx.recv().await,
                    // Players: wait forever
                    None => std::future::pending().await,
                }
            } => for_room(received, &conn.room_id),

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handlers::handle_message(client_msg, &conn, &state).await,
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                        None
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        };

        if let Some(msg) = outgoing.as_ref().and_then(to_text) {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    }

    tracing::info!(
        "WebSocket connection closed: {:?} in room {}",
        conn.role,
        conn.room_id
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(room: Option<&str>, role: Option<&str>, passkey: Option<&str>) -> WsQuery {
        WsQuery {
            room: room.map(String::from),
            role: role.map(String::from),
            passkey: passkey.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_authorize_player_needs_existing_room() {
        let state = AppState::new();
        let room = state.create_room("Quiz", "abcdefghij").await.unwrap();

        let (conn, info) = authorize(&state, &query(Some(room.id.as_str()), None, None))
            .await
            .unwrap();
        assert_eq!(conn.role, Role::Player);
        assert_eq!(info.id, room.id);

        assert!(matches!(
            authorize(&state, &query(Some("missing"), None, None)).await,
            Err(PollError::RoomNotFound)
        ));
        assert!(matches!(
            authorize(&state, &query(None, None, None)).await,
            Err(PollError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_authorize_owner_needs_passkey() {
        let state = AppState::new();
        let room = state.create_room("Quiz", "abcdefghij").await.unwrap();

        let (conn, _) = authorize(&state, &query(Some(room.id.as_str()), Some("host"), Some("abcdefghij")))
            .await
            .unwrap();
        assert_eq!(conn.role, Role::Host);

        assert!(matches!(
            authorize(&state, &query(Some(room.id.as_str()), Some("admin"), None)).await,
            Err(PollError::InvalidPasskey)
        ));
        assert!(matches!(
            authorize(&state, &query(Some(room.id.as_str()), Some("host"), Some("0123456789"))).await,
            Err(PollError::InvalidPasskey)
        ));
    }

    #[test]
    fn test_for_room_filters_other_rooms() {
        let msg = RoomBroadcast {
            room_id: "a".to_string(),
            msg: ServerMessage::Finished,
        };
        assert!(for_room(Ok(msg.clone()), "a").is_some());
        assert!(for_room(Ok(msg), "b").is_none());
        assert!(for_room(Err(RecvError::Lagged(3)), "a").is_none());
    }
}
