//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Authorization is checked here, then dispatched to role-specific handler modules.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::{admin, host, player, Connection};

/// Macro to check authorization and return early if unauthorized
macro_rules! require {
    ($allowed:expr, $who:expr, $action:expr) => {
        if !$allowed {
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only {} can {}", $who, $action),
            });
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    conn: &Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    let room_id = conn.room_id.as_str();

    match msg {
        // Host-only commands
        ClientMessage::HostAddQuestion { text, max_options } => {
            require!(conn.role == Role::Host, "the host", "add questions");
            host::handle_add_question(state, room_id, text, max_options).await
        }

        ClientMessage::HostListQuestions => {
            require!(conn.role == Role::Host, "the host", "list questions");
            host::handle_list_questions(state, room_id).await
        }

        ClientMessage::HostPublish => {
            require!(conn.role == Role::Host, "the host", "publish the room");
            host::handle_publish(state, room_id).await
        }

        ClientMessage::HostAddOption { question_id, text } => {
            require!(conn.role == Role::Host, "the host", "seed options");
            host::handle_add_option(state, room_id, question_id, text).await
        }

        // Player messages
        ClientMessage::Join {
            name,
            session_token,
        } => player::handle_join(state, room_id, name, session_token).await,

        ClientMessage::NextQuestion { session_token } => {
            player::handle_next_question(state, room_id, session_token).await
        }

        ClientMessage::Vote {
            session_token,
            question_id,
            option_id,
        } => player::handle_vote(state, room_id, session_token, question_id, option_id).await,

        ClientMessage::AddOption {
            session_token,
            question_id,
            text,
        } => player::handle_add_option(state, room_id, session_token, question_id, text).await,

        // Host or admin
        ClientMessage::AdminResults => {
            require!(conn.role.is_owner(), "the room owner", "view results");
            admin::handle_results(state, room_id).await
        }
    }
}
