use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    NewNote, NewUser, Note, NoteContent, NoteFilter, NoteRow, NoteWithUploader, User, UserRow,
};
use crate::database::store::Store;

const USER_COLUMNS: &str =
    "id, name, phone, email, age, gender, password_hash, profile_photo, created_at, updated_at";

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.uploader_id, n.title, n.description, n.note_type,
           n.file_url, n.file_name, n.file_size, n.link_url,
           n.created_at, n.updated_at,
           u.name AS uploader_name, u.email AS uploader_email
    FROM notes n
    LEFT JOIN users u ON u.id = n.uploader_id
"#;

/// Postgres-backed store
pub struct PgStore {
    db: DatabaseManager,
}

impl PgStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

/// Map the unique email index violation onto the domain error
fn map_insert_error(err: sqlx::Error) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DatabaseError::DuplicateEmail,
        _ => DatabaseError::Sqlx(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let pool = self.db.pool().await?;

        let query = format!(
            "INSERT INTO users (id, name, phone, email, age, gender, password_hash, profile_photo)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.phone)
            .bind(&user.email)
            .bind(user.age)
            .bind(user.gender.as_str())
            .bind(&user.password_hash)
            .bind(&user.profile_photo)
            .fetch_one(pool)
            .await
            .map_err(map_insert_error)?;

        User::try_from(row)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let pool = self.db.pool().await?;

        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let pool = self.db.pool().await?;

        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note, DatabaseError> {
        note.check()?;
        let pool = self.db.pool().await?;

        let (file_url, file_name, file_size, link_url) = match &note.content {
            NoteContent::Pdf {
                file_url,
                file_name,
                file_size,
            } => (Some(file_url.as_str()), Some(file_name.as_str()), Some(*file_size), None),
            NoteContent::Link { link_url } => (None, None, None, Some(link_url.as_str())),
        };

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO notes (id, uploader_id, title, description, note_type,
                                file_url, file_name, file_size, link_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(note.uploader_id)
        .bind(&note.title)
        .bind(&note.description)
        .bind(note.content.note_type().as_str())
        .bind(file_url)
        .bind(file_name)
        .bind(file_size)
        .bind(link_url)
        .execute(pool)
        .await?;

        self.find_note(id)
            .await?
            .ok_or_else(|| DatabaseError::InvalidRecord(format!("note {} vanished after insert", id)))
    }

    async fn find_note(&self, id: Uuid) -> Result<Option<Note>, DatabaseError> {
        let pool = self.db.pool().await?;

        let query = format!("{} WHERE n.id = $1", NOTE_SELECT);
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(|row| NoteWithUploader::try_from(row).map(|n| n.note))
            .transpose()
    }

    async fn list_notes(&self, filter: NoteFilter) -> Result<Vec<NoteWithUploader>, DatabaseError> {
        let pool = self.db.pool().await?;

        let query = format!(
            "{} WHERE ($1::text IS NULL OR n.note_type = $1)
                AND ($2::uuid IS NULL OR n.uploader_id = $2)
              ORDER BY n.created_at DESC, n.id DESC",
            NOTE_SELECT
        );

        let rows = sqlx::query_as::<_, NoteRow>(&query)
            .bind(filter.note_type.map(|t| t.as_str()))
            .bind(filter.uploader_id)
            .fetch_all(pool)
            .await?;

        rows.into_iter().map(NoteWithUploader::try_from).collect()
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let pool = self.db.pool().await?;

        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.db.health_check().await
    }
}
