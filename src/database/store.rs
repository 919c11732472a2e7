use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{NewNote, NewUser, Note, NoteFilter, NoteWithUploader, User};
use crate::database::DatabaseError;

/// Persistence seam for users and notes.
///
/// Implementations must enforce email uniqueness atomically and return
/// `DatabaseError::DuplicateEmail` on conflict. Listings are newest first.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// `email` must already be normalized
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn insert_note(&self, note: NewNote) -> Result<Note, DatabaseError>;

    async fn find_note(&self, id: Uuid) -> Result<Option<Note>, DatabaseError>;

    async fn list_notes(&self, filter: NoteFilter) -> Result<Vec<NoteWithUploader>, DatabaseError>;

    /// Returns whether a record was removed
    async fn delete_note(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
