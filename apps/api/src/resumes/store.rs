//! Resume persistence. The typed document is stored in JSONB columns; each
//! write bumps a revision stamp used to order concurrent autosaves.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::document::model::ResumeDocument;
use crate::models::resume::{ResumeRow, ResumeSummary};

/// Outcome of comparing an incoming revision stamp with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionCheck {
    /// Write and store `next` as the new revision.
    Apply { next: i64 },
    /// The incoming write is not newer than what is stored.
    Stale { stored: i64 },
}

/// A stamped write applies only when strictly newer than the stored
/// revision. Unstamped writes always apply and bump the revision by one.
pub fn check_revision(stored: i64, incoming: Option<i64>) -> RevisionCheck {
    match incoming {
        Some(rev) if rev > stored => RevisionCheck::Apply { next: rev },
        Some(_) => RevisionCheck::Stale { stored },
        None => RevisionCheck::Apply { next: stored + 1 },
    }
}

pub async fn list_resumes(db: &PgPool, user_id: Uuid) -> Result<Vec<ResumeSummary>, AppError> {
    let rows = sqlx::query_as::<_, ResumeSummary>(
        r#"
        SELECT id, name, template, revision, is_active, created_at, updated_at
        FROM resumes
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_resume(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    doc: &ResumeDocument,
) -> Result<ResumeRow, AppError> {
    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (user_id, name, content, config, template, zoom, styling)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(Json(&doc.content))
    .bind(Json(&doc.config))
    .bind(&doc.template)
    .bind(doc.zoom as i16)
    .bind(Json(&doc.styling))
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Loads a resume owned by `user_id`. Someone else's resume is reported as
/// missing.
pub async fn get_resume(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<ResumeRow, AppError> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// Writes the document if the row still carries the revision it was read at.
/// Returns `None` when another write got there first.
pub async fn update_resume(
    db: &PgPool,
    current: &ResumeRow,
    name: &str,
    doc: &ResumeDocument,
    next_revision: i64,
) -> Result<Option<ResumeRow>, AppError> {
    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes
        SET name = $1, content = $2, config = $3, template = $4, zoom = $5,
            styling = $6, revision = $7, updated_at = now()
        WHERE id = $8 AND user_id = $9 AND revision = $10
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(Json(&doc.content))
    .bind(Json(&doc.config))
    .bind(&doc.template)
    .bind(doc.zoom as i16)
    .bind(Json(&doc.styling))
    .bind(next_revision)
    .bind(current.id)
    .bind(current.user_id)
    .bind(current.revision)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete_resume(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(())
}
