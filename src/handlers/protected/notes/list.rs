// handlers/protected/notes/list.rs - Note listing handlers

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{NoteFilter, NoteType};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

async fn list(state: &AppState, filter: NoteFilter) -> ApiResult<Value> {
    let notes = state.store.list_notes(filter).await?;
    Ok(ApiResponse::success(json!({ "notes": notes })))
}

/// GET /api/notes - every note, newest first, with uploader summaries
pub async fn notes_get(State(state): State<AppState>) -> ApiResult<Value> {
    list(&state, NoteFilter::all()).await
}

/// GET /api/notes/type/:type - notes of one kind
pub async fn notes_by_type_get(
    State(state): State<AppState>,
    Path(note_type): Path<String>,
) -> ApiResult<Value> {
    let note_type: NoteType = note_type
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid note type. Must be \"pdf\" or \"link\""))?;

    list(&state, NoteFilter::by_type(note_type)).await
}

/// GET /api/notes/my-notes - notes uploaded by the caller
pub async fn my_notes_get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Value> {
    list(&state, NoteFilter::by_uploader(user.id)).await
}
