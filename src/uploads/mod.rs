//! Disk-backed storage for multipart file uploads.
//!
//! Files land under the configured upload directory (profile photos in a
//! `profiles/` subdirectory) and are exposed to clients as `/uploads/...`
//! URLs served by the static file layer.

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use chrono::Utc;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// URL prefix under which the upload directory is served
pub const URL_PREFIX: &str = "/uploads";

/// Subdirectory holding profile photos
pub const PROFILE_DIR: &str = "profiles";

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("Only image files (JPEG, PNG, GIF) are allowed for profile photos")]
    NotImage,

    #[error("File too large. Maximum size is {limit_mb}MB")]
    TooLarge { limit_mb: u64 },

    #[error("Unexpected file field '{0}'")]
    UnexpectedFile(String),

    #[error("Malformed multipart request: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What a file field is allowed to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    ProfilePhoto,
}

impl FileKind {
    fn prefix(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::ProfilePhoto => "profile",
        }
    }

    fn subdir(&self) -> Option<&'static str> {
        match self {
            FileKind::Pdf => None,
            FileKind::ProfilePhoto => Some(PROFILE_DIR),
        }
    }

    /// Check the declared content type (and extension, for images) before any bytes are written
    pub fn accepts(&self, file_name: &str, content_type: Option<&str>) -> Result<(), UploadError> {
        let mime = content_type.unwrap_or_default().to_ascii_lowercase();
        match self {
            FileKind::Pdf => {
                if mime == "application/pdf" {
                    Ok(())
                } else {
                    Err(UploadError::NotPdf)
                }
            }
            FileKind::ProfilePhoto => {
                let ext_ok = extension(file_name)
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
                    .unwrap_or(false);
                let mime_ok = mime
                    .strip_prefix("image/")
                    .map(|subtype| IMAGE_EXTENSIONS.contains(&subtype))
                    .unwrap_or(false);

                if ext_ok && mime_ok {
                    Ok(())
                } else {
                    Err(UploadError::NotImage)
                }
            }
        }
    }
}

/// A file that has been fully written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub url: String,
    pub original_name: String,
    pub size: u64,
}

/// Text fields plus at most one stored file from a multipart body
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<StoredFile>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory tree; called once at startup
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.root.join(PROFILE_DIR)).await
    }

    /// Drain a multipart body, streaming the single allowed file field to disk.
    ///
    /// If anything fails after the file was written, the file is removed
    /// before the error is returned.
    pub async fn read_form(
        &self,
        multipart: &mut Multipart,
        file_field: &str,
        kind: FileKind,
        max_bytes: u64,
    ) -> Result<UploadForm, UploadError> {
        let mut form = UploadForm::default();

        let result = self
            .collect_fields(multipart, file_field, kind, max_bytes, &mut form)
            .await;

        if let Err(err) = result {
            if let Some(file) = form.file.take() {
                self.discard(&file).await;
            }
            return Err(err);
        }

        Ok(form)
    }

    async fn collect_fields(
        &self,
        multipart: &mut Multipart,
        file_field: &str,
        kind: FileKind,
        max_bytes: u64,
        form: &mut UploadForm,
    ) -> Result<(), UploadError> {
        while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, max_bytes))? {
            let name = field.name().unwrap_or_default().to_string();

            if name == file_field {
                if form.file.is_some() {
                    return Err(UploadError::UnexpectedFile(name));
                }
                form.file = Some(self.save_field(field, kind, max_bytes).await?);
            } else if field.file_name().is_some() {
                return Err(UploadError::UnexpectedFile(name));
            } else {
                let value = field.text().await.map_err(|e| multipart_error(e, max_bytes))?;
                form.fields.insert(name, value);
            }
        }

        Ok(())
    }

    /// Stream one file field to a freshly named file, enforcing `max_bytes`
    pub async fn save_field(
        &self,
        mut field: Field<'_>,
        kind: FileKind,
        max_bytes: u64,
    ) -> Result<StoredFile, UploadError> {
        let original_name = field.file_name().unwrap_or("upload").to_string();
        kind.accepts(&original_name, field.content_type())?;

        let stored_name = stored_file_name(kind.prefix(), &original_name);
        let (path, url) = match kind.subdir() {
            Some(dir) => (
                self.root.join(dir).join(&stored_name),
                format!("{}/{}/{}", URL_PREFIX, dir, stored_name),
            ),
            None => (
                self.root.join(&stored_name),
                format!("{}/{}", URL_PREFIX, stored_name),
            ),
        };

        match write_chunks(&mut field, &path, max_bytes).await {
            Ok(size) => {
                debug!("Stored upload {} ({} bytes) at {}", original_name, size, path.display());
                Ok(StoredFile {
                    path,
                    url,
                    original_name,
                    size,
                })
            }
            Err(err) => {
                if let Err(e) = fs::remove_file(&path).await {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!("Failed to remove partial upload {}: {}", path.display(), e);
                    }
                }
                Err(err)
            }
        }
    }

    /// Best-effort removal of a file written for a request that then failed
    pub async fn discard(&self, file: &StoredFile) {
        match fs::remove_file(&file.path).await {
            Ok(()) => debug!("Removed orphaned upload {}", file.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove orphaned upload {}: {}", file.path.display(), e),
        }
    }

    /// Map a public `/uploads/...` URL back to a path inside the upload root.
    ///
    /// Returns `None` for URLs outside the prefix or containing anything
    /// other than plain path segments.
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(URL_PREFIX)?.strip_prefix('/')?;
        let relative = Path::new(relative);

        let mut components = relative.components().peekable();
        components.peek()?;
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }

        Some(self.root.join(relative))
    }

    /// Delete the file behind a public URL. A missing file is not an error;
    /// returns whether something was removed.
    pub async fn remove_url(&self, url: &str) -> io::Result<bool> {
        let Some(path) = self.resolve_url(url) else {
            warn!("Refusing to delete file outside upload directory: {}", url);
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

async fn write_chunks(field: &mut Field<'_>, path: &Path, max_bytes: u64) -> Result<u64, UploadError> {
    let mut file = fs::File::create(path).await?;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, max_bytes))? {
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(too_large(max_bytes));
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(size)
}

fn multipart_error(err: MultipartError, max_bytes: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        UploadError::Malformed(err.body_text())
    }
}

fn too_large(max_bytes: u64) -> UploadError {
    UploadError::TooLarge {
        limit_mb: max_bytes.div_ceil(1024 * 1024),
    }
}

/// Lower-cased extension of `file_name`, if it has one
fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// `<prefix>-<millis>-<random><.ext>`; the extension is kept only if alphanumeric
fn stored_file_name(prefix: &str, original_name: &str) -> String {
    let suffix = rand::random::<u32>() % 1_000_000_000;
    let ext = extension(original_name)
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    format!("{}-{}-{}{}", prefix, Utc::now().timestamp_millis(), suffix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_requires_pdf_content_type() {
        assert!(FileKind::Pdf.accepts("notes.pdf", Some("application/pdf")).is_ok());
        assert!(FileKind::Pdf.accepts("notes.pdf", Some("Application/PDF")).is_ok());
        assert!(matches!(
            FileKind::Pdf.accepts("notes.pdf", Some("text/plain")),
            Err(UploadError::NotPdf)
        ));
        assert!(FileKind::Pdf.accepts("notes.pdf", None).is_err());
    }

    #[test]
    fn photo_requires_image_extension_and_type() {
        let kind = FileKind::ProfilePhoto;
        assert!(kind.accepts("me.PNG", Some("image/png")).is_ok());
        assert!(kind.accepts("me.jpg", Some("image/jpeg")).is_ok());
        assert!(kind.accepts("me.gif", Some("image/gif")).is_ok());
        assert!(kind.accepts("me.png", Some("application/pdf")).is_err());
        assert!(kind.accepts("me.exe", Some("image/png")).is_err());
        assert!(kind.accepts("me", Some("image/png")).is_err());
        assert!(kind.accepts("me.webp", Some("image/webp")).is_err());
    }

    #[test]
    fn stored_names_keep_safe_extension_only() {
        let name = stored_file_name("pdf", "Lecture Notes.PDF");
        assert!(name.starts_with("pdf-"));
        assert!(name.ends_with(".pdf"));

        let name = stored_file_name("pdf", "weird.p/df");
        assert!(!name.contains('/'));

        let a = stored_file_name("pdf", "a.pdf");
        let b = stored_file_name("pdf", "a.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_url_stays_inside_root() {
        let store = UploadStore::new("/srv/uploads");
        assert_eq!(
            store.resolve_url("/uploads/pdf-1-2.pdf"),
            Some(PathBuf::from("/srv/uploads/pdf-1-2.pdf"))
        );
        assert_eq!(
            store.resolve_url("/uploads/profiles/profile-1-2.png"),
            Some(PathBuf::from("/srv/uploads/profiles/profile-1-2.png"))
        );
        assert_eq!(store.resolve_url("/uploads/../etc/passwd"), None);
        assert_eq!(store.resolve_url("/uploads//etc/passwd"), None);
        assert_eq!(store.resolve_url("/uploads/"), None);
        assert_eq!(store.resolve_url("/static/x.pdf"), None);
        assert_eq!(store.resolve_url("https://x.com/a.pdf"), None);
    }

    #[tokio::test]
    async fn remove_url_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        store.ensure_dirs().await.unwrap();

        let path = dir.path().join("pdf-1-1.pdf");
        fs::write(&path, b"%PDF-1.4").await.unwrap();

        assert!(store.remove_url("/uploads/pdf-1-1.pdf").await.unwrap());
        assert!(!path.exists());
        assert!(!store.remove_url("/uploads/pdf-1-1.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn ensure_dirs_creates_profile_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("nested"));
        store.ensure_dirs().await.unwrap();
        assert!(dir.path().join("nested").join(PROFILE_DIR).is_dir());
    }
}
