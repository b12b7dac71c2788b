use crate::SignalingService;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jamroom_core::RoomId;
use serde_json::json;
use tracing::error;

/// `GET /api/rooms`
pub async fn list_rooms(State(service): State<SignalingService>) -> Response {
    match service.list_rooms().await {
        Ok(rooms) => Json(rooms).into_response(),
        Err(e) => unavailable(e),
    }
}

/// `GET /api/rooms/{id}`
pub async fn get_room(Path(id): Path<String>, State(service): State<SignalingService>) -> Response {
    match service.get_room(RoomId::from(id)).await {
        Ok(Some(room)) => Json(room).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Room not found" })),
        )
            .into_response(),
        Err(e) => unavailable(e),
    }
}

fn unavailable(e: crate::ServerError) -> Response {
    error!("Snapshot query failed: {}", e);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}
