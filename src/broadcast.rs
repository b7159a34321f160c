use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

const RESULTS_INTERVAL: Duration = Duration::from_millis(500);

/// Push fresh results for every room whose votes changed since the last tick
pub async fn broadcast_dirty_results(state: &AppState) {
    for room_id in state.take_dirty_rooms().await {
        match state.room_results(&room_id).await {
            Ok(results) => {
                state.broadcast_to_owners(&room_id, ServerMessage::Results { results });
            }
            Err(e) => tracing::warn!("Skipping results broadcast for {}: {}", room_id, e),
        }
    }
}

/// Spawn a background task that broadcasts live results to host and admin sockets
pub fn spawn_results_broadcaster(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(RESULTS_INTERVAL).await;
            broadcast_dirty_results(&state).await;
        }
    });
}
