#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use share_me_api::app::{create_router, AppState};
use share_me_api::config::AppConfig;
use share_me_api::database::MemoryStore;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "hunter22";

/// In-process server bound to its own port, store, and upload directory.
/// Dropping it (at the end of the test's runtime) shuts everything down.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
    upload_dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Filesystem path behind a `/uploads/...` URL
    pub fn upload_path(&self, url: &str) -> PathBuf {
        let relative = url.trim_start_matches("/uploads/");
        self.upload_dir.path().join(relative)
    }

    /// Number of regular files anywhere under the upload directory
    pub fn stored_file_count(&self) -> usize {
        fn count(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|entry| {
                            let path = entry.path();
                            if path.is_dir() {
                                count(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        count(self.upload_dir.path())
    }

    pub async fn register(&self, name: &str, email: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/auth/register"))
            .multipart(register_form(name, email))
            .send()
            .await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    /// Register a fresh account and log it in, returning the user JSON and token
    pub async fn register_and_login(&self, name: &str, email: &str) -> Result<(Value, String)> {
        let res = self.register(name, email).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let res = self.login(email, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let body = res.json::<Value>().await?;
        let token = body["data"]["token"]
            .as_str()
            .context("login response has no token")?
            .to_string();

        Ok((body["data"]["user"].clone(), token))
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn delete_authed(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn share_link(&self, token: &str, title: &str, link_url: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/notes/share-link"))
            .bearer_auth(token)
            .json(&json!({ "title": title, "linkUrl": link_url }))
            .send()
            .await?)
    }

    pub async fn upload_pdf(&self, token: &str, form: Form) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/notes/upload-pdf"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?)
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(|_| {}).await
}

/// Start a server after letting the caller adjust the test configuration
pub async fn spawn_server_with(tweak: impl FnOnce(&mut AppConfig)) -> Result<TestServer> {
    let upload_dir = tempfile::tempdir().context("failed to create upload dir")?;

    let mut config = AppConfig::development();
    config.uploads.upload_dir = upload_dir.path().to_path_buf();
    config.security.jwt_secret = TEST_SECRET.to_string();
    tweak(&mut config);

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config.clone(), store.clone())?;
    state.uploads.ensure_dirs().await?;

    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    let app = create_router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
        config,
        upload_dir,
    })
}

pub fn register_form(name: &str, email: &str) -> Form {
    Form::new()
        .text("name", name.to_string())
        .text("phone", "5550001111")
        .text("email", email.to_string())
        .text("age", "30")
        .text("gender", "female")
        .text("password", PASSWORD)
}

pub fn pdf_part(bytes: Vec<u8>) -> Part {
    Part::bytes(bytes)
        .file_name("lecture.pdf")
        .mime_str("application/pdf")
        .expect("valid mime")
}

/// A small but plausible PDF body
pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n".to_vec()
}

pub fn pdf_form(title: &str, part: Part) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("description", "Week one notes")
        .part("pdf", part)
}
