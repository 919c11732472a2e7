pub mod note;
pub mod user;

pub use note::{
    is_http_url, NewNote, Note, NoteContent, NoteFilter, NoteRow, NoteType, NoteWithUploader,
    DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};
pub use user::{normalize_email, Gender, NewUser, UploaderSummary, User, UserRow};
