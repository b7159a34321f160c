//! State export/import and on-disk snapshots.
//!
//! A snapshot holds every table; broadcast channels and the dirty-room set
//! are runtime-only and start empty after an import.

use super::AppState;
use crate::error::PollError;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Schema version for export format compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// A serializable snapshot of the entire poll state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollStateExport {
    /// Schema version for forward compatibility
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    pub rooms: HashMap<RoomId, Room>,
    pub questions: HashMap<QuestionId, Question>,
    pub options: HashMap<OptionId, PollOption>,
    pub players: HashMap<PlayerId, Player>,
    /// Ordered by `seq`
    #[serde(default)]
    pub votes: Vec<Vote>,
}

impl PollStateExport {
    /// Validate the export before import
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Export schema version {} is newer than supported version {}. \
                 Please update the server.",
                self.schema_version, EXPORT_SCHEMA_VERSION
            ));
        }

        for (id, question) in &self.questions {
            if !self.rooms.contains_key(&question.room_id) {
                return Err(format!(
                    "Question '{}' references room '{}' which doesn't exist",
                    id, question.room_id
                ));
            }
        }

        for (id, option) in &self.options {
            if !self.questions.contains_key(&option.question_id) {
                return Err(format!(
                    "Option '{}' references question '{}' which doesn't exist",
                    id, option.question_id
                ));
            }
        }

        for (id, player) in &self.players {
            if !self.rooms.contains_key(&player.room_id) {
                return Err(format!(
                    "Player '{}' references room '{}' which doesn't exist",
                    id, player.room_id
                ));
            }
        }

        for vote in &self.votes {
            if !self.rooms.contains_key(&vote.room_id) {
                return Err(format!(
                    "Vote '{}' references room '{}' which doesn't exist",
                    vote.id, vote.room_id
                ));
            }
            if !self.questions.contains_key(&vote.question_id) {
                return Err(format!(
                    "Vote '{}' references question '{}' which doesn't exist",
                    vote.id, vote.question_id
                ));
            }
            if !self.options.contains_key(&vote.option_id) {
                return Err(format!(
                    "Vote '{}' references option '{}' which doesn't exist",
                    vote.id, vote.option_id
                ));
            }
            if !self.players.contains_key(&vote.player_id) {
                return Err(format!(
                    "Vote '{}' references player '{}' which doesn't exist",
                    vote.id, vote.player_id
                ));
            }
        }

        Ok(())
    }
}

impl AppState {
    pub async fn export_state(&self) -> PollStateExport {
        let rooms = self.rooms.read().await.clone();
        let questions = self.questions.read().await.clone();
        let options = self.options.read().await.clone();
        let players = self.players.read().await.clone();
        let votes = self.votes.read().await.clone();

        PollStateExport {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: super::now(),
            rooms,
            questions,
            options,
            players,
            votes,
        }
    }

    /// Replace all tables with the snapshot contents
    pub async fn import_state(&self, export: PollStateExport) -> Result<(), PollError> {
        export.validate().map_err(PollError::InvalidSnapshot)?;

        let mut votes = export.votes;
        votes.sort_by_key(|v| v.seq);

        let mut rooms = self.rooms.write().await;
        let mut questions = self.questions.write().await;
        let mut options = self.options.write().await;
        let mut players = self.players.write().await;
        let mut current_votes = self.votes.write().await;

        tracing::info!(
            "Importing snapshot from {}: {} rooms, {} votes",
            export.exported_at,
            export.rooms.len(),
            votes.len()
        );

        *rooms = export.rooms;
        *questions = export.questions;
        *options = export.options;
        *players = export.players;
        *current_votes = votes;

        drop((rooms, questions, options, players, current_votes));
        self.dirty_rooms.write().await.clear();
        Ok(())
    }

    /// Write a snapshot as pretty JSON, atomically via a sibling temp file
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), PollError> {
        let export = self.export_state().await;
        let json = serde_json::to_vec_pretty(&export)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Load a snapshot if one exists. Returns whether anything was imported.
    pub async fn load_snapshot(&self, path: &Path) -> Result<bool, PollError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let export: PollStateExport = serde_json::from_slice(&bytes)?;
        self.import_state(export).await?;
        Ok(true)
    }
}

/// Spawn a background task that writes a snapshot every `interval`
pub fn spawn_snapshot_writer(state: Arc<AppState>, path: std::path::PathBuf, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = state.save_snapshot(&path).await {
                tracing::error!("Failed to write snapshot to {}: {}", path.display(), e);
            } else {
                tracing::debug!("Snapshot written to {}", path.display());
            }
        }
    });
}
