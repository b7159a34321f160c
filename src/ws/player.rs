//! Player message handlers
//!
//! Handlers for joining, walking the questions and voting.

use crate::protocol::ServerMessage;
use crate::session;
use crate::state::AppState;
use std::sync::Arc;

/// Follow-up after a successful vote: the next question, or `finished`
async fn next_question_message(
    state: &Arc<AppState>,
    room_id: &str,
    session_token: &str,
) -> ServerMessage {
    match state.next_question(room_id, session_token).await {
        Ok(Some(view)) => ServerMessage::CurrentQuestion { view },
        Ok(None) => ServerMessage::Finished,
        Err(e) => e.into(),
    }
}

pub async fn handle_join(
    state: &Arc<AppState>,
    room_id: &str,
    name: String,
    session_token: Option<String>,
) -> Option<ServerMessage> {
    tracing::info!("Player joining room {}: {}", room_id, name);
    match state
        .join_room(room_id, &name, session_token.as_deref())
        .await
    {
        Ok(player) => Some(ServerMessage::Joined {
            player_id: player.id,
            name: player.name,
            storage_key: session::storage_key(room_id),
            session_token: player.session_token,
        }),
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_next_question(
    state: &Arc<AppState>,
    room_id: &str,
    session_token: String,
) -> Option<ServerMessage> {
    Some(next_question_message(state, room_id, &session_token).await)
}

pub async fn handle_vote(
    state: &Arc<AppState>,
    room_id: &str,
    session_token: String,
    question_id: String,
    option_id: String,
) -> Option<ServerMessage> {
    tracing::info!("Vote: question={}, option={}", question_id, option_id);
    match state
        .cast_vote(room_id, &session_token, &question_id, &option_id)
        .await
    {
        Ok(vote) => Some(ServerMessage::VoteAck {
            question_id: vote.question_id,
            option_id: vote.option_id,
        }),
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_add_option(
    state: &Arc<AppState>,
    room_id: &str,
    session_token: String,
    question_id: String,
    text: String,
) -> Option<ServerMessage> {
    tracing::info!("Custom option for {}: {}", question_id, text);
    match state
        .add_option_and_vote(room_id, &session_token, &question_id, &text)
        .await
    {
        // option_added goes out on the room broadcast; the voter gets the ack
        Ok((_, vote)) => Some(ServerMessage::VoteAck {
            question_id: vote.question_id,
            option_id: vote.option_id,
        }),
        Err(e) => Some(e.into()),
    }
}
