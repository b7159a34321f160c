pub mod export;
mod option;
mod player;
mod question;
pub mod results;
mod room;
mod vote;

use crate::error::PollError;
use crate::protocol::{RoomBroadcast, ServerMessage};
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared application state
///
/// Lock order when several tables are held at once:
/// rooms, questions, options, players, votes.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    pub questions: Arc<RwLock<HashMap<QuestionId, Question>>>,
    pub options: Arc<RwLock<HashMap<OptionId, PollOption>>>,
    pub players: Arc<RwLock<HashMap<PlayerId, Player>>>,
    /// Append-only, ordered by `seq`
    pub votes: Arc<RwLock<Vec<Vote>>>,
    /// Rooms whose results changed since the last results broadcast
    pub dirty_rooms: Arc<RwLock<HashSet<RoomId>>>,
    /// Broadcast channel for every socket in a room
    pub broadcast: broadcast::Sender<RoomBroadcast>,
    /// Broadcast channel for host and admin sockets only
    pub owner_broadcast: broadcast::Sender<RoomBroadcast>,
}

impl AppState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        let (owner_tx, _owner_rx) = broadcast::channel(100);
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            questions: Arc::new(RwLock::new(HashMap::new())),
            options: Arc::new(RwLock::new(HashMap::new())),
            players: Arc::new(RwLock::new(HashMap::new())),
            votes: Arc::new(RwLock::new(Vec::new())),
            dirty_rooms: Arc::new(RwLock::new(HashSet::new())),
            broadcast: tx,
            owner_broadcast: owner_tx,
        }
    }

    /// Send a message to every socket connected to `room_id`
    pub fn broadcast_to_room(&self, room_id: &str, msg: ServerMessage) {
        // No receivers connected is fine
        let _ = self.broadcast.send(RoomBroadcast {
            room_id: room_id.to_string(),
            msg,
        });
    }

    /// Send a message to host and admin sockets of `room_id`
    pub fn broadcast_to_owners(&self, room_id: &str, msg: ServerMessage) {
        let _ = self.owner_broadcast.send(RoomBroadcast {
            room_id: room_id.to_string(),
            msg,
        });
    }

    pub(crate) async fn mark_dirty(&self, room_id: &str) {
        self.dirty_rooms.write().await.insert(room_id.to_string());
    }

    /// Take the set of rooms whose results need re-broadcasting
    pub async fn take_dirty_rooms(&self) -> Vec<RoomId> {
        self.dirty_rooms.write().await.drain().collect()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Trim `text` and check it is non-empty and at most `max_chars` characters
pub(crate) fn clean_text(text: &str, what: &str, max_chars: usize) -> Result<String, PollError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PollError::InvalidInput(format!("{} is required", what)));
    }
    if text.chars().count() > max_chars {
        return Err(PollError::InvalidInput(format!(
            "{} must be at most {} characters",
            what, max_chars
        )));
    }
    Ok(text.to_string())
}
