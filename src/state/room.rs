use super::{clean_text, new_id, now, AppState};
use crate::auth::constant_time_eq;
use crate::error::PollError;
use crate::types::*;
use sha2::{Digest, Sha256};

/// Salted digest of a room passkey (the room id is the salt)
pub(crate) fn hash_passkey(room_id: &str, passkey: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(room_id.as_bytes());
    hasher.update(b":");
    hasher.update(passkey.as_bytes());
    hex::encode(hasher.finalize())
}

fn clean_passkey(passkey: &str) -> Result<&str, PollError> {
    let passkey = passkey.trim();
    if passkey.chars().count() != PASSKEY_LEN {
        return Err(PollError::InvalidInput(format!(
            "Passkey must be exactly {} characters",
            PASSKEY_LEN
        )));
    }
    Ok(passkey)
}

fn passkey_matches(room: &Room, passkey: &str) -> bool {
    let candidate = hash_passkey(&room.id, passkey);
    constant_time_eq(candidate.as_bytes(), room.passkey_hash.as_bytes())
}

impl AppState {
    /// Create a draft room owned by whoever knows `passkey`
    pub async fn create_room(&self, room_name: &str, passkey: &str) -> Result<Room, PollError> {
        let room_name = clean_text(room_name, "Room name", MAX_NAME_CHARS)?;
        let passkey = clean_passkey(passkey)?;

        let mut rooms = self.rooms.write().await;
        if rooms.values().any(|r| r.room_name == room_name) {
            return Err(PollError::RoomNameTaken);
        }

        let id = new_id();
        let room = Room {
            passkey_hash: hash_passkey(&id, passkey),
            id,
            room_name,
            status: RoomStatus::Draft,
            created_at: now(),
            published_at: None,
        };
        rooms.insert(room.id.clone(), room.clone());

        tracing::info!("Created room {} ({})", room.room_name, room.id);
        Ok(room)
    }

    /// Find the room a passkey unlocks. Passkeys are not unique across rooms,
    /// so the earliest created match wins.
    pub async fn admin_login(&self, passkey: &str) -> Result<RoomId, PollError> {
        let passkey = clean_passkey(passkey)?;
        let rooms = self.rooms.read().await;

        rooms
            .values()
            .filter(|r| passkey_matches(r, passkey))
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .map(|r| r.id.clone())
            .ok_or(PollError::InvalidPasskey)
    }

    /// Check that `passkey` unlocks `room_id`
    pub async fn verify_passkey(&self, room_id: &str, passkey: &str) -> Result<Room, PollError> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(room_id).ok_or(PollError::RoomNotFound)?;
        if passkey_matches(room, passkey.trim()) {
            Ok(room.clone())
        } else {
            Err(PollError::InvalidPasskey)
        }
    }

    /// Make a room live so players can join and vote. Publishing twice is a no-op.
    pub async fn publish_room(&self, room_id: &str) -> Result<Room, PollError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(room_id).ok_or(PollError::RoomNotFound)?;

        if room.status != RoomStatus::Live {
            room.status = RoomStatus::Live;
            room.published_at = Some(now());
            tracing::info!("Room {} is live", room_id);
        }
        Ok(room.clone())
    }

    pub async fn get_room(&self, room_id: &str) -> Option<Room> {
        self.rooms.read().await.get(room_id).cloned()
    }

    pub async fn get_room_info(&self, room_id: &str) -> Option<RoomInfo> {
        self.rooms.read().await.get(room_id).map(RoomInfo::from)
    }

    pub(crate) async fn require_live_room(&self, room_id: &str) -> Result<(), PollError> {
        match self.rooms.read().await.get(room_id) {
            None => Err(PollError::RoomNotFound),
            Some(room) if room.status != RoomStatus::Live => Err(PollError::RoomNotLive),
            Some(_) => Ok(()),
        }
    }
}
