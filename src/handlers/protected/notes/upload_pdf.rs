// handlers/protected/notes/upload_pdf.rs - POST /api/notes/upload-pdf handler

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension,
};
use serde_json::{json, Value};
use validator::Validate;

use super::NoteDetails;
use crate::app::AppState;
use crate::database::models::{NewNote, NoteContent};
use crate::error::ApiError;
use crate::handlers::multipart_body;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::uploads::{FileKind, UploadForm};

/**
 * POST /api/notes/upload-pdf - Upload a PDF as a new note
 *
 * Multipart fields: `pdf` (application/pdf, size capped by config),
 * `title`, optional `description`.
 *
 * The file is streamed to disk before the text fields can be checked, so
 * any failure after that point deletes it again before responding.
 */
pub async fn upload_pdf_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    let mut multipart = multipart_body(payload)?;
    let form = state
        .uploads
        .read_form(
            &mut multipart,
            "pdf",
            FileKind::Pdf,
            state.config.uploads.max_pdf_bytes,
        )
        .await?;

    match create_pdf_note(&state, user.id, &form).await {
        Ok(response) => Ok(response),
        Err(err) => {
            if let Some(file) = &form.file {
                state.uploads.discard(file).await;
            }
            Err(err)
        }
    }
}

async fn create_pdf_note(state: &AppState, uploader_id: uuid::Uuid, form: &UploadForm) -> ApiResult<Value> {
    let details = NoteDetails::new(form.text("title"), form.text("description"));
    details.validate()?;

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("No PDF file uploaded"))?;

    let note = state
        .store
        .insert_note(NewNote {
            uploader_id,
            title: details.title,
            description: details.description,
            content: NoteContent::Pdf {
                file_url: file.url.clone(),
                file_name: file.original_name.clone(),
                file_size: file.size as i64,
            },
        })
        .await?;

    tracing::info!("User {} uploaded PDF note {} ({} bytes)", uploader_id, note.id, file.size);

    Ok(ApiResponse::created(json!({ "note": note })).with_message("PDF uploaded successfully"))
}
