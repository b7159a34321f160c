//! Host-only command handlers
//!
//! All handlers in this module require the Host role.
//! Authorization is checked in the main dispatch layer before calling these.
//! Successful changes go out on the room broadcast, which the host socket
//! also receives, so they return no direct reply.

use crate::error::PollError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{share_path, DEFAULT_MAX_OPTIONS};
use std::sync::Arc;

pub async fn handle_add_question(
    state: &Arc<AppState>,
    room_id: &str,
    text: String,
    max_options: Option<u32>,
) -> Option<ServerMessage> {
    let max_options = max_options.unwrap_or(DEFAULT_MAX_OPTIONS);
    tracing::info!("Host adding question (max {} options): {}", max_options, text);

    match state.add_question(room_id, &text, max_options).await {
        Ok(question) => {
            state.broadcast_to_room(room_id, ServerMessage::QuestionAdded { question });
            None
        }
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_list_questions(state: &Arc<AppState>, room_id: &str) -> Option<ServerMessage> {
    Some(ServerMessage::Questions {
        list: state.list_questions(room_id).await,
    })
}

pub async fn handle_publish(state: &Arc<AppState>, room_id: &str) -> Option<ServerMessage> {
    tracing::info!("Host publishing room {}", room_id);
    match state.publish_room(room_id).await {
        Ok(room) => {
            state.broadcast_to_room(
                room_id,
                ServerMessage::RoomPublished {
                    room: (&room).into(),
                    share_path: share_path(&room.id),
                },
            );
            None
        }
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_add_option(
    state: &Arc<AppState>,
    room_id: &str,
    question_id: String,
    text: String,
) -> Option<ServerMessage> {
    tracing::info!("Host seeding option for {}: {}", question_id, text);

    let in_room = state
        .get_question(&question_id)
        .await
        .is_some_and(|q| q.room_id == room_id);
    if !in_room {
        return Some(PollError::QuestionNotFound.into());
    }

    match state.add_option(&question_id, &text, None).await {
        Ok(_) => None,
        Err(e) => Some(e.into()),
    }
}
