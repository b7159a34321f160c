use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{api, auth::{self, AuthConfig}, state::AppState, ws};

/// Assemble the HTTP and WebSocket routes
pub fn build_router(state: Arc<AppState>, auth_config: Arc<AuthConfig>, static_dir: &Path) -> Router {
    // Operator routes (with HTTP Basic Auth)
    let operator_routes = Router::new()
        .route("/api/state/export", get(api::export_state))
        .route("/api/state/import", post(api::import_state))
        .layer(middleware::from_fn_with_state(
            auth_config,
            auth::operator_auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/rooms", post(api::create_room))
        .route("/api/admin/login", post(api::admin_login))
        .route("/api/rooms/{room_id}", get(api::get_room))
        .route("/api/rooms/{room_id}/questions", get(api::list_questions))
        .route("/api/rooms/{room_id}/results", get(api::results))
        .route("/api/rooms/{room_id}/results.csv", get(api::results_csv));

    // Screens are single pages; deep links like /play/{room_id} load their page
    let screens = Router::new()
        .route_service("/host/{room_id}", ServeFile::new(static_dir.join("host.html")))
        .route_service("/play/{room_id}", ServeFile::new(static_dir.join("play.html")))
        .route_service("/admin", ServeFile::new(static_dir.join("admin.html")));

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api_routes)
        .merge(operator_routes)
        .merge(screens)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
