use crate::types::*;
use serde::{Deserialize, Serialize};

/// Protocol version sent in `welcome`
pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    // Host-only messages
    HostAddQuestion {
        text: String,
        #[serde(default)]
        max_options: Option<u32>,
    },
    HostListQuestions,
    HostPublish,
    /// Seed an option without voting for it
    HostAddOption {
        question_id: QuestionId,
        text: String,
    },

    // Player messages
    Join {
        #[serde(default)]
        name: String,
        /// Token previously handed out for this room, if the client kept one
        #[serde(default)]
        session_token: Option<String>,
    },
    NextQuestion {
        session_token: String,
    },
    Vote {
        session_token: String,
        question_id: QuestionId,
        option_id: OptionId,
    },
    /// Add a custom option and vote for it
    AddOption {
        session_token: String,
        question_id: QuestionId,
        text: String,
    },

    // Admin-only messages
    AdminResults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        room: RoomInfo,
        server_now: String,
    },
    Questions {
        list: Vec<Question>,
    },
    QuestionAdded {
        question: Question,
    },
    RoomPublished {
        room: RoomInfo,
        share_path: String,
    },
    Joined {
        player_id: PlayerId,
        name: String,
        session_token: String,
        /// Where the client should keep `session_token`
        storage_key: String,
    },
    CurrentQuestion {
        view: QuestionView,
    },
    /// Player has answered every question
    Finished,
    VoteAck {
        question_id: QuestionId,
        option_id: OptionId,
    },
    OptionAdded {
        question_id: QuestionId,
        option: PollOption,
    },
    Results {
        results: RoomResults,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl From<crate::error::PollError> for ServerMessage {
    fn from(e: crate::error::PollError) -> Self {
        ServerMessage::Error {
            code: e.code().to_string(),
            msg: e.to_string(),
        }
    }
}

/// A message addressed to the sockets of one room
#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub room_id: RoomId,
    pub msg: ServerMessage,
}

/// The question a player should answer next
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionView {
    pub question: Question,
    pub options: Vec<PollOption>,
    /// False once the question holds `max_options` options
    pub can_add_option: bool,
    /// 1-based position and question count, for "2 of 5" displays
    pub position: u32,
    pub total: u32,
}

/// One chart slice: an option and the votes it got
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSlice {
    /// None for votes whose option can't be found
    pub option_id: Option<OptionId>,
    pub text: String,
    pub votes: u32,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionResults {
    pub question_id: QuestionId,
    pub order_index: u32,
    pub text: String,
    pub total_votes: u32,
    /// Empty when nobody answered
    pub slices: Vec<ResultSlice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomResults {
    pub room: RoomInfo,
    pub player_count: u32,
    pub total_votes: u32,
    pub questions: Vec<QuestionResults>,
}

/// A CSV export row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRow {
    pub player: String,
    pub question: String,
    pub option: String,
}
