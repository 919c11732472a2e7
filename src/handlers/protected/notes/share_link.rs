// handlers/protected/notes/share_link.rs - POST /api/notes/share-link handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::{Validate, ValidationError, ValidationErrors};

use super::NoteDetails;
use crate::app::AppState;
use crate::database::models::{is_http_url, NewNote, NoteContent};
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
}

impl ShareLinkRequest {
    /// Validate every field, returning the trimmed details and URL
    pub fn check(&self) -> Result<(NoteDetails, String), ValidationErrors> {
        let details = NoteDetails::new(self.title.as_deref(), self.description.as_deref());
        let mut errors = match details.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let link_url = self.link_url.as_deref().unwrap_or_default().trim().to_string();
        if !is_http_url(&link_url) {
            let mut err = ValidationError::new("url");
            err.message = Some("Please provide a valid URL".into());
            errors.add("link_url", err);
        }

        if errors.errors().is_empty() {
            Ok((details, link_url))
        } else {
            Err(errors)
        }
    }
}

/// POST /api/notes/share-link - Share an external http(s) link as a note
pub async fn share_link_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<ShareLinkRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let request = json_body(payload)?;
    let (details, link_url) = request.check()?;

    let note = state
        .store
        .insert_note(NewNote {
            uploader_id: user.id,
            title: details.title,
            description: details.description,
            content: NoteContent::Link { link_url },
        })
        .await?;

    tracing::info!("User {} shared link note {}", user.id, note.id);

    Ok(ApiResponse::created(json!({ "note": note })).with_message("Link shared successfully"))
}
