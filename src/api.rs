//! HTTP API endpoints.
//!
//! Room creation and admin login back the landing screen; the results
//! endpoints back the admin dashboard; export/import are operator tools.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::PollError;
use crate::protocol::RoomResults;
use crate::state::export::PollStateExport;
use crate::state::results::CSV_FILE_NAME;
use crate::state::AppState;
use crate::types::{host_path, share_path, Question, RoomId, RoomInfo};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub passkey: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room: RoomInfo,
    /// Link to hand out to players
    pub share_path: String,
    pub host_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginRequest {
    pub passkey: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasskeyQuery {
    pub passkey: Option<String>,
}

/// Create a draft room.
///
/// POST /api/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), PollError> {
    let room = state.create_room(&req.room_name, &req.passkey).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            share_path: share_path(&room.id),
            host_path: host_path(&room.id),
            room: (&room).into(),
        }),
    ))
}

/// Find the room a passkey belongs to.
///
/// POST /api/admin/login
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, PollError> {
    let room_id = state.admin_login(&req.passkey).await?;
    tracing::info!("Admin login for room {}", room_id);
    Ok(Json(AdminLoginResponse { room_id }))
}

/// Public room info for the play screen.
///
/// GET /api/rooms/{room_id}
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomInfo>, PollError> {
    state
        .get_room_info(&room_id)
        .await
        .map(Json)
        .ok_or(PollError::RoomNotFound)
}

/// GET /api/rooms/{room_id}/questions
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Vec<Question>>, PollError> {
    if state.get_room(&room_id).await.is_none() {
        return Err(PollError::RoomNotFound);
    }
    Ok(Json(state.list_questions(&room_id).await))
}

async fn verify_admin(
    state: &AppState,
    room_id: &str,
    query: &PasskeyQuery,
) -> Result<(), PollError> {
    let passkey = query.passkey.as_deref().unwrap_or_default();
    state.verify_passkey(room_id, passkey).await.map(|_| ())
}

/// Chart data for every question of a room.
///
/// GET /api/rooms/{room_id}/results?passkey=...
pub async fn results(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<PasskeyQuery>,
) -> Result<Json<RoomResults>, PollError> {
    verify_admin(&state, &room_id, &query).await?;
    Ok(Json(state.room_results(&room_id).await?))
}

/// Download every vote as CSV.
///
/// GET /api/rooms/{room_id}/results.csv?passkey=...
pub async fn results_csv(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<PasskeyQuery>,
) -> Result<Response, PollError> {
    verify_admin(&state, &room_id, &query).await?;
    let csv = state.results_csv(&room_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Export the entire poll state as JSON.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<PollStateExport> {
    Json(state.export_state().await)
}

/// Import a poll state snapshot.
///
/// POST /api/state/import
///
/// Replaces all current state with the imported data.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Json(export): Json<PollStateExport>,
) -> Response {
    match state.import_state(export).await {
        Ok(()) => (StatusCode::OK, "State imported successfully").into_response(),
        Err(e) => {
            tracing::error!("State import failed: {}", e);
            (StatusCode::BAD_REQUEST, format!("Import failed: {}", e)).into_response()
        }
    }
}
