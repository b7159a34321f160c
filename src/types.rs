use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomId = String;
pub type QuestionId = String;
pub type OptionId = String;
pub type PlayerId = String;
pub type VoteId = String;

/// Passkeys are exactly this many characters after trimming
pub const PASSKEY_LEN: usize = 10;

/// Option caps the host can pick from when authoring a question
pub const ALLOWED_MAX_OPTIONS: &[u32] = &[5, 10, 15];
pub const DEFAULT_MAX_OPTIONS: u32 = 10;

pub const MAX_NAME_CHARS: usize = 40;
pub const MAX_TEXT_CHARS: usize = 280;
pub const MAX_SESSION_TOKEN_CHARS: usize = 64;

/// Label used when a vote references a row that can't be found
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Pie chart palette, cycled per slice
pub const CHART_COLORS: &[&str] = &[
    "#f97316", "#22c55e", "#3b82f6", "#a855f7", "#ef4444", "#14b8a6",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Draft,
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_name: String,
    /// Hex SHA-256 of `room_id:passkey`
    pub passkey_hash: String,
    pub status: RoomStatus,
    pub created_at: String,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Room as seen by anyone holding the share link (no passkey material)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomInfo {
    pub id: RoomId,
    pub room_name: String,
    pub status: RoomStatus,
    pub created_at: String,
    pub published_at: Option<String>,
}

impl From<&Room> for RoomInfo {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            room_name: room.room_name.clone(),
            status: room.status,
            created_at: room.created_at.clone(),
            published_at: room.published_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub room_id: RoomId,
    pub text: String,
    /// 1-based position within the room
    pub order_index: u32,
    pub max_options: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub text: String,
    /// Display name of the player who added it (None for seeded options)
    pub created_by: Option<String>,
    /// Insertion position within the question
    pub position: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub name: String,
    pub session_token: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub id: VoteId,
    pub room_id: RoomId,
    pub question_id: QuestionId,
    pub option_id: OptionId,
    pub player_id: PlayerId,
    /// Global cast order
    pub seq: u64,
    pub ts: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Player,
    Admin,
}

impl Role {
    /// Host and admin sockets act on behalf of the room owner
    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Host | Role::Admin)
    }
}

/// Link players use to join a room
pub fn share_path(room_id: &str) -> String {
    format!("/play/{}", room_id)
}

pub fn host_path(room_id: &str) -> String {
    format!("/host/{}", room_id)
}
