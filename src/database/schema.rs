use sqlx::PgPool;
use tracing::debug;

use crate::database::DatabaseError;

/// Idempotent DDL run once per pool, in order
const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        name          TEXT NOT NULL,
        phone         TEXT NOT NULL,
        email         TEXT NOT NULL,
        age           INTEGER NOT NULL CHECK (age BETWEEN 1 AND 120),
        gender        TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
        password_hash TEXT NOT NULL,
        profile_photo TEXT,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // Emails are normalized before insert, so a plain unique index is enough
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)",
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        id          UUID PRIMARY KEY,
        uploader_id UUID NOT NULL,
        title       TEXT NOT NULL CHECK (char_length(title) BETWEEN 1 AND 100),
        description TEXT CHECK (description IS NULL OR char_length(description) <= 500),
        note_type   TEXT NOT NULL CHECK (note_type IN ('pdf', 'link')),
        file_url    TEXT,
        file_name   TEXT,
        file_size   BIGINT,
        link_url    TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT notes_content_matches_type CHECK (
            (note_type = 'pdf'
                AND file_url IS NOT NULL AND file_name IS NOT NULL AND file_size IS NOT NULL
                AND link_url IS NULL)
            OR
            (note_type = 'link'
                AND link_url IS NOT NULL
                AND file_url IS NULL AND file_name IS NULL AND file_size IS NULL)
        )
    )
    "#,
    "CREATE INDEX IF NOT EXISTS notes_uploader_created_idx ON notes (uploader_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS notes_type_idx ON notes (note_type)",
    "CREATE INDEX IF NOT EXISTS notes_created_idx ON notes (created_at DESC)",
];

/// Create tables and indexes if they do not exist yet
pub async fn bootstrap(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("Schema bootstrap applied {} statements", STATEMENTS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_unique_indexed() {
        assert!(STATEMENTS
            .iter()
            .any(|s| s.contains("UNIQUE INDEX") && s.contains("users (email)")));
    }

    #[test]
    fn statements_are_idempotent() {
        for statement in STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"), "not idempotent: {}", statement);
        }
    }
}
