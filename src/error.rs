use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors returned by state operations, shared by the HTTP and WebSocket surfaces
#[derive(Error, Debug)]
pub enum PollError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Room name already exists. Choose a different name.")]
    RoomNameTaken,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Invalid passkey")]
    InvalidPasskey,

    #[error("Room is not live yet")]
    RoomNotLive,

    #[error("Question not found")]
    QuestionNotFound,

    #[error("Option not found")]
    OptionNotFound,

    #[error("Unknown session, join the room first")]
    UnknownSession,

    #[error("You already voted on this question")]
    AlreadyVoted,

    #[error("This question already has {0} options")]
    OptionLimitReached(u32),

    #[error("An option with that text already exists")]
    DuplicateOption,

    #[error("Snapshot rejected: {0}")]
    InvalidSnapshot(String),

    #[error("Snapshot IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PollError {
    /// Stable code sent to WebSocket clients in `error` messages
    pub fn code(&self) -> &'static str {
        match self {
            PollError::InvalidInput(_) => "INVALID_INPUT",
            PollError::RoomNameTaken => "ROOM_NAME_TAKEN",
            PollError::RoomNotFound => "ROOM_NOT_FOUND",
            PollError::InvalidPasskey => "INVALID_PASSKEY",
            PollError::RoomNotLive => "ROOM_NOT_LIVE",
            PollError::QuestionNotFound => "QUESTION_NOT_FOUND",
            PollError::OptionNotFound => "OPTION_NOT_FOUND",
            PollError::UnknownSession => "UNKNOWN_SESSION",
            PollError::AlreadyVoted => "ALREADY_VOTED",
            PollError::OptionLimitReached(_) => "OPTION_LIMIT_REACHED",
            PollError::DuplicateOption => "DUPLICATE_OPTION",
            PollError::InvalidSnapshot(_) => "INVALID_SNAPSHOT",
            PollError::Io(_) | PollError::Json(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PollError::InvalidInput(_) | PollError::InvalidSnapshot(_) => StatusCode::BAD_REQUEST,
            PollError::RoomNameTaken
            | PollError::AlreadyVoted
            | PollError::OptionLimitReached(_)
            | PollError::DuplicateOption
            | PollError::RoomNotLive => StatusCode::CONFLICT,
            PollError::RoomNotFound | PollError::QuestionNotFound | PollError::OptionNotFound => {
                StatusCode::NOT_FOUND
            }
            PollError::InvalidPasskey | PollError::UnknownSession => StatusCode::UNAUTHORIZED,
            PollError::Io(_) | PollError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
