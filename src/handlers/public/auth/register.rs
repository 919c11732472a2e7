// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::{multipart::MultipartRejection, Multipart, State};
use serde_json::{json, Value};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::app::AppState;
use crate::database::models::{normalize_email, Gender, NewUser};
use crate::error::ApiError;
use crate::handlers::multipart_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::uploads::{FileKind, UploadForm};

/// Registration fields as submitted, trimmed and normalized
#[derive(Debug, Default, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: String,
    #[validate(length(min = 10, message = "Please enter a valid phone number"))]
    pub phone: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    // Unparseable input is kept as 0 so the range check reports it
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: i64,
    pub gender: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

impl RegisterForm {
    pub fn from_form(form: &UploadForm) -> Self {
        let text = |name: &str| form.text(name).unwrap_or_default().trim().to_string();

        Self {
            name: text("name"),
            phone: text("phone"),
            email: normalize_email(&text("email")),
            age: text("age").parse().unwrap_or(0),
            gender: text("gender"),
            // Passwords are taken verbatim
            password: form.text("password").unwrap_or_default().to_string(),
        }
    }

    /// Run every field check, returning the parsed gender on success
    pub fn check(&self) -> Result<Gender, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let gender = self.gender.parse::<Gender>().ok();
        if gender.is_none() {
            let mut err = ValidationError::new("gender");
            err.message = Some("Gender must be male, female, or other".into());
            errors.add("gender", err);
        }

        match gender {
            Some(gender) if errors.errors().is_empty() => Ok(gender),
            _ => Err(errors),
        }
    }
}

/**
 * POST /api/auth/register - Create a user account
 *
 * Multipart fields: name, phone, email, age, gender, password, and an
 * optional `profilePhoto` image (jpeg/png/gif, size capped by config).
 * Responds 201 with the public user fields. A stored photo is removed again
 * if the registration does not go through.
 */
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    let mut multipart = multipart_body(payload)?;
    let form = state
        .uploads
        .read_form(
            &mut multipart,
            "profilePhoto",
            FileKind::ProfilePhoto,
            state.config.uploads.max_photo_bytes,
        )
        .await?;

    match create_user(&state, &form).await {
        Ok(response) => Ok(response),
        Err(err) => {
            if let Some(photo) = &form.file {
                state.uploads.discard(photo).await;
            }
            Err(err)
        }
    }
}

async fn create_user(state: &AppState, form: &UploadForm) -> ApiResult<Value> {
    let input = RegisterForm::from_form(form);
    let gender = input.check()?;

    let password_hash = state.passwords.hash_password(&input.password)?;

    // Uniqueness is enforced by the store; a duplicate surfaces as DatabaseError::DuplicateEmail
    let user = state
        .store
        .insert_user(NewUser {
            name: input.name,
            phone: input.phone,
            email: input.email,
            age: input.age as i32,
            gender,
            password_hash,
            profile_photo: form.file.as_ref().map(|f| f.url.clone()),
        })
        .await
        .map_err(ApiError::from)?;

    tracing::info!("Registered user {} ({})", user.id, user.email);

    Ok(ApiResponse::created(json!({ "user": user }))
        .with_message("User registered successfully. Please login with your credentials."))
}
