//! Results handlers for host and admin sockets

use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

pub async fn handle_results(state: &Arc<AppState>, room_id: &str) -> Option<ServerMessage> {
    match state.room_results(room_id).await {
        Ok(results) => Some(ServerMessage::Results { results }),
        Err(e) => Some(e.into()),
    }
}
