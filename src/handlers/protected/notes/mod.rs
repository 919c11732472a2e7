// handlers/protected/notes/mod.rs - Note endpoints
//
// POST   /api/notes/upload-pdf   multipart pdf + title/description
// POST   /api/notes/share-link   JSON title/description/linkUrl
// GET    /api/notes              every note, newest first
// GET    /api/notes/type/:type   pdf or link only
// GET    /api/notes/my-notes     the caller's notes
// DELETE /api/notes/:note_id     uploader only

use validator::Validate;

pub mod delete;
pub mod list;
pub mod share_link;
pub mod upload_pdf;

pub use delete::note_delete;
pub use list::{my_notes_get, notes_by_type_get, notes_get};
pub use share_link::share_link_post;
pub use upload_pdf::upload_pdf_post;

/// Title and description shared by both note kinds
#[derive(Debug, Default, Validate)]
pub struct NoteDetails {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
}

impl NoteDetails {
    /// Trims both fields; a blank description counts as absent
    pub fn new(title: Option<&str>, description: Option<&str>) -> Self {
        Self {
            title: title.unwrap_or_default().trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        }
    }
}
