use super::{clean_text, new_id, now, AppState};
use crate::error::PollError;
use crate::session;
use crate::types::*;

/// Name for players who leave the name field blank
fn generate_display_name() -> String {
    petname::petname(2, " ").unwrap_or_else(|| "Anonymous player".to_string())
}

impl AppState {
    /// Join a live room, or rejoin when the session token is already known
    pub async fn join_room(
        &self,
        room_id: &str,
        name: &str,
        session_token: Option<&str>,
    ) -> Result<Player, PollError> {
        self.require_live_room(room_id).await?;

        let token = session::resolve_token(session_token)?;
        let name = if name.trim().is_empty() {
            None
        } else {
            Some(clean_text(name, "Name", MAX_NAME_CHARS)?)
        };

        let mut players = self.players.write().await;

        if let Some(player) = players
            .values_mut()
            .find(|p| p.room_id == room_id && p.session_token == token)
        {
            if let Some(name) = name {
                player.name = name;
            }
            tracing::info!("Player {} rejoined room {}", player.id, room_id);
            return Ok(player.clone());
        }

        let player = Player {
            id: new_id(),
            room_id: room_id.to_string(),
            name: name.unwrap_or_else(generate_display_name),
            session_token: token,
            joined_at: now(),
        };
        players.insert(player.id.clone(), player.clone());

        tracing::info!("Player {} joined room {} as {}", player.id, room_id, player.name);
        Ok(player)
    }

    /// Look up a player by session token within a room
    pub async fn player_by_token(&self, room_id: &str, token: &str) -> Option<Player> {
        self.players
            .read()
            .await
            .values()
            .find(|p| p.room_id == room_id && p.session_token == token)
            .cloned()
    }

    pub async fn list_players(&self, room_id: &str) -> Vec<Player> {
        let mut list: Vec<Player> = self
            .players
            .read()
            .await
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn live_room(state: &AppState) -> Room {
        let room = state.create_room("Quiz", "abcdefghij").await.unwrap();
        state.publish_room(&room.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_join_requires_live_room() {
        let state = AppState::new();
        let room = state.create_room("Quiz", "abcdefghij").await.unwrap();

        assert!(matches!(
            state.join_room(&room.id, "Alice", None).await,
            Err(PollError::RoomNotLive)
        ));
        assert!(matches!(
            state.join_room("missing", "Alice", None).await,
            Err(PollError::RoomNotFound)
        ));
    }

    #[tokio::test]
    async fn test_join_issues_token() {
        let state = AppState::new();
        let room = live_room(&state).await;

        let player = state.join_room(&room.id, " Alice ", None).await.unwrap();
        assert_eq!(player.name, "Alice");
        assert!(!player.session_token.is_empty());

        let found = state
            .player_by_token(&room.id, &player.session_token)
            .await
            .unwrap();
        assert_eq!(found.id, player.id);
    }

    #[tokio::test]
    async fn test_rejoin_with_same_token() {
        let state = AppState::new();
        let room = live_room(&state).await;

        let first = state
            .join_room(&room.id, "Alice", Some("token-1"))
            .await
            .unwrap();
        let again = state
            .join_room(&room.id, "Alicia", Some("token-1"))
            .await
            .unwrap();
        let blank = state.join_room(&room.id, "", Some("token-1")).await.unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(again.name, "Alicia");
        assert_eq!(blank.name, "Alicia");
        assert_eq!(state.list_players(&room.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_same_token_in_other_room_is_other_player() {
        let state = AppState::new();
        let room_a = live_room(&state).await;
        let room_b = state.create_room("Other", "abcdefghij").await.unwrap();
        state.publish_room(&room_b.id).await.unwrap();

        let a = state.join_room(&room_a.id, "Alice", Some("tok")).await.unwrap();
        let b = state.join_room(&room_b.id, "Alice", Some("tok")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_blank_name_gets_generated() {
        let state = AppState::new();
        let room = live_room(&state).await;

        let player = state.join_room(&room.id, "   ", None).await.unwrap();
        assert!(!player.name.trim().is_empty());
    }

    #[tokio::test]
    async fn test_join_rejects_bad_token() {
        let state = AppState::new();
        let room = live_room(&state).await;

        assert!(matches!(
            state.join_room(&room.id, "Alice", Some("no spaces please")).await,
            Err(PollError::InvalidInput(_))
        ));
    }
}
