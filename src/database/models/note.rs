use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use super::user::UploaderSummary;
use crate::database::DatabaseError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Pdf,
    Link,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Pdf => "pdf",
            NoteType::Link => "link",
        }
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(NoteType::Pdf),
            "link" => Ok(NoteType::Link),
            other => Err(format!("unknown note type '{}'", other)),
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload. Serialized inline with a `type` tag:
/// `{"type":"pdf","fileUrl":..,"fileName":..,"fileSize":..}` or
/// `{"type":"link","linkUrl":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NoteContent {
    #[serde(rename_all = "camelCase")]
    Pdf {
        file_url: String,
        file_name: String,
        file_size: i64,
    },
    #[serde(rename_all = "camelCase")]
    Link { link_url: String },
}

impl NoteContent {
    pub fn note_type(&self) -> NoteType {
        match self {
            NoteContent::Pdf { .. } => NoteType::Pdf,
            NoteContent::Link { .. } => NoteType::Link,
        }
    }

    /// Per-variant required fields must be present and well formed
    pub fn check(&self) -> Result<(), String> {
        match self {
            NoteContent::Pdf {
                file_url,
                file_name,
                file_size,
            } => {
                if file_url.is_empty() || file_name.is_empty() {
                    return Err("pdf note requires fileUrl and fileName".into());
                }
                if *file_size < 0 {
                    return Err("pdf note has negative fileSize".into());
                }
                Ok(())
            }
            NoteContent::Link { link_url } => {
                if is_http_url(link_url) {
                    Ok(())
                } else {
                    Err(format!("link note has invalid linkUrl '{}'", link_url))
                }
            }
        }
    }
}

/// Absolute http(s) URL with a host
pub fn is_http_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub content: NoteContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.uploader_id == user_id
    }
}

/// Note plus the uploader's public fields, as returned by listings
#[derive(Debug, Clone, Serialize)]
pub struct NoteWithUploader {
    #[serde(flatten)]
    pub note: Note,
    pub uploader: Option<UploaderSummary>,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub uploader_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content: NoteContent,
}

impl NewNote {
    pub fn check(&self) -> Result<(), DatabaseError> {
        let title_len = self.title.chars().count();
        if title_len == 0 || title_len > TITLE_MAX_CHARS {
            return Err(DatabaseError::InvalidRecord(format!(
                "title must be 1..={} characters",
                TITLE_MAX_CHARS
            )));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(DatabaseError::InvalidRecord(format!(
                    "description exceeds {} characters",
                    DESCRIPTION_MAX_CHARS
                )));
            }
        }
        self.content.check().map_err(DatabaseError::InvalidRecord)
    }
}

/// Query shape shared by the three listing endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub note_type: Option<NoteType>,
    pub uploader_id: Option<Uuid>,
}

impl NoteFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_type(note_type: NoteType) -> Self {
        Self {
            note_type: Some(note_type),
            ..Self::default()
        }
    }

    pub fn by_uploader(uploader_id: Uuid) -> Self {
        Self {
            uploader_id: Some(uploader_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.note_type.map_or(true, |t| note.content.note_type() == t)
            && self.uploader_id.map_or(true, |id| note.uploader_id == id)
    }
}

/// Flat `notes` row, optionally joined with the uploader's name and email
#[derive(Debug, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub note_type: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub link_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub uploader_name: Option<String>,
    pub uploader_email: Option<String>,
}

impl TryFrom<NoteRow> for NoteWithUploader {
    type Error = DatabaseError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        let invalid = |detail: &str| DatabaseError::InvalidRecord(format!("note {}: {}", row.id, detail));

        let note_type: NoteType = row.note_type.parse().map_err(|e: String| invalid(&e))?;
        let content = match note_type {
            NoteType::Pdf => match (&row.file_url, &row.file_name, row.file_size) {
                (Some(url), Some(name), Some(size)) => NoteContent::Pdf {
                    file_url: url.clone(),
                    file_name: name.clone(),
                    file_size: size,
                },
                _ => return Err(invalid("pdf row is missing file fields")),
            },
            NoteType::Link => match &row.link_url {
                Some(url) => NoteContent::Link {
                    link_url: url.clone(),
                },
                None => return Err(invalid("link row is missing link_url")),
            },
        };

        let uploader = match (row.uploader_name, row.uploader_email) {
            (Some(name), Some(email)) => Some(UploaderSummary {
                id: row.uploader_id,
                name,
                email,
            }),
            _ => None,
        };

        Ok(NoteWithUploader {
            note: Note {
                id: row.id,
                uploader_id: row.uploader_id,
                title: row.title,
                description: row.description,
                content,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            uploader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_note(url: &str) -> NewNote {
        NewNote {
            uploader_id: Uuid::new_v4(),
            title: "T".into(),
            description: None,
            content: NoteContent::Link {
                link_url: url.into(),
            },
        }
    }

    #[test]
    fn accepts_only_http_urls() {
        assert!(is_http_url("https://x.com"));
        assert!(is_http_url("http://example.com/a?b=c"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("not a url"));
        assert!(!is_http_url("/relative/path"));
    }

    #[test]
    fn new_note_check_enforces_lengths_and_variant() {
        assert!(link_note("https://x.com").check().is_ok());
        assert!(link_note("mailto:a@b.c").check().is_err());

        let mut note = link_note("https://x.com");
        note.title = "a".repeat(TITLE_MAX_CHARS + 1);
        assert!(note.check().is_err());

        let mut note = link_note("https://x.com");
        note.title = String::new();
        assert!(note.check().is_err());
    }

    #[test]
    fn pdf_note_serializes_with_type_tag() {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            uploader_id: Uuid::new_v4(),
            title: "Lecture 1".into(),
            description: Some("Intro".into()),
            content: NoteContent::Pdf {
                file_url: "/uploads/pdf-1.pdf".into(),
                file_name: "lecture1.pdf".into(),
                file_size: 1234,
            },
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["type"], "pdf");
        assert_eq!(value["fileUrl"], "/uploads/pdf-1.pdf");
        assert_eq!(value["fileName"], "lecture1.pdf");
        assert_eq!(value["fileSize"], 1234);
        assert!(value.get("linkUrl").is_none());
        assert_eq!(value["uploaderId"], note.uploader_id.to_string());
    }

    #[test]
    fn row_with_wrong_variant_fields_is_rejected() {
        let now = Utc::now();
        let row = NoteRow {
            id: Uuid::new_v4(),
            uploader_id: Uuid::new_v4(),
            title: "T".into(),
            description: None,
            note_type: "link".into(),
            file_url: Some("/uploads/x.pdf".into()),
            file_name: None,
            file_size: None,
            link_url: None,
            created_at: now,
            updated_at: now,
            uploader_name: None,
            uploader_email: None,
        };

        assert!(matches!(
            NoteWithUploader::try_from(row),
            Err(DatabaseError::InvalidRecord(_))
        ));
    }

    #[test]
    fn filter_matches_type_and_owner() {
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            uploader_id: owner,
            title: "T".into(),
            description: None,
            content: NoteContent::Link {
                link_url: "https://x.com".into(),
            },
            created_at: now,
            updated_at: now,
        };

        assert!(NoteFilter::all().matches(&note));
        assert!(NoteFilter::by_type(NoteType::Link).matches(&note));
        assert!(!NoteFilter::by_type(NoteType::Pdf).matches(&note));
        assert!(NoteFilter::by_uploader(owner).matches(&note));
        assert!(!NoteFilter::by_uploader(Uuid::new_v4()).matches(&note));
    }
}
