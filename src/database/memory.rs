use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    NewNote, NewUser, Note, NoteFilter, NoteWithUploader, UploaderSummary, User,
};
use crate::database::store::Store;
use crate::database::DatabaseError;

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    // Insertion order; listings walk it backwards
    notes: Vec<Note>,
}

/// Process-local store used when no `DATABASE_URL` is configured, and by tests
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn note_count(&self) -> usize {
        self.state.read().await.notes.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;

        // Check and insert happen under one write guard
        if state.emails.contains_key(&user.email) {
            return Err(DatabaseError::DuplicateEmail);
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            phone: user.phone,
            email: user.email,
            age: user.age,
            gender: user.gender,
            password_hash: user.password_hash,
            profile_photo: user.profile_photo,
            created_at: now,
            updated_at: now,
        };

        state.emails.insert(record.email.clone(), record.id);
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .emails
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note, DatabaseError> {
        note.check()?;

        let now = Utc::now();
        let record = Note {
            id: Uuid::new_v4(),
            uploader_id: note.uploader_id,
            title: note.title,
            description: note.description,
            content: note.content,
            created_at: now,
            updated_at: now,
        };

        self.state.write().await.notes.push(record.clone());
        Ok(record)
    }

    async fn find_note(&self, id: Uuid) -> Result<Option<Note>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notes(&self, filter: NoteFilter) -> Result<Vec<NoteWithUploader>, DatabaseError> {
        let state = self.state.read().await;

        let mut notes: Vec<NoteWithUploader> = state
            .notes
            .iter()
            .rev()
            .filter(|n| filter.matches(n))
            .map(|n| NoteWithUploader {
                note: n.clone(),
                uploader: state.users.get(&n.uploader_id).map(UploaderSummary::from),
            })
            .collect();

        // Stable sort keeps reverse insertion order for equal timestamps
        notes.sort_by(|a, b| b.note.created_at.cmp(&a.note.created_at));
        Ok(notes)
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        Ok(state.notes.len() < before)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
