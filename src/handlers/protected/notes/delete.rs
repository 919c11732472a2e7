// handlers/protected/notes/delete.rs - DELETE /api/notes/:note_id handler

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::NoteContent;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

const NOT_FOUND: &str = "Note not found";

/**
 * DELETE /api/notes/:note_id - Delete a note the caller uploaded
 *
 * For PDF notes the stored file goes first. A file that is already gone
 * is fine; any other filesystem error aborts with the record intact so
 * the delete can be retried.
 */
pub async fn note_delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(note_id): Path<String>,
) -> ApiResult<Value> {
    // A malformed id cannot name an existing note
    let note_id = Uuid::parse_str(&note_id).map_err(|_| ApiError::not_found(NOT_FOUND))?;

    let note = state
        .store
        .find_note(note_id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    if !note.is_owned_by(user.id) {
        tracing::info!("User {} refused delete of note {} owned by {}", user.id, note.id, note.uploader_id);
        return Err(ApiError::forbidden("Not authorized to delete this note"));
    }

    if let NoteContent::Pdf { file_url, .. } = &note.content {
        match state.uploads.remove_url(file_url).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("File for note {} was already missing: {}", note.id, file_url),
            Err(e) => {
                tracing::error!("Failed to remove file {} for note {}: {}", file_url, note.id, e);
                return Err(ApiError::internal_server_error("Failed to delete note file"));
            }
        }
    }

    if !state.store.delete_note(note.id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    tracing::info!("User {} deleted note {}", user.id, note.id);

    Ok(ApiResponse::success(json!({ "id": note.id })).with_message("Note deleted successfully"))
}
