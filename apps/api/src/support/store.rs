use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::support::{BugReportRow, FeedbackRow};
use crate::support::requests::{BugReportUpdate, NewBugReport, NewFeedback};

pub const ADMIN_LIST_LIMIT: i64 = 200;

pub async fn insert_bug_report(
    db: &PgPool,
    external_user_id: Option<&str>,
    report: &NewBugReport,
    screenshot_url: Option<&str>,
) -> Result<BugReportRow, AppError> {
    let row = sqlx::query_as::<_, BugReportRow>(
        r#"
        INSERT INTO bug_reports (external_user_id, email, page_url, description, screenshot_url, status)
        VALUES ($1, $2, $3, $4, $5, 'open')
        RETURNING *
        "#,
    )
    .bind(external_user_id)
    .bind(report.email.as_deref())
    .bind(report.page_url.as_deref())
    .bind(&report.description)
    .bind(screenshot_url)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_bug_reports_for_user(
    db: &PgPool,
    external_user_id: &str,
) -> Result<Vec<BugReportRow>, AppError> {
    let rows = sqlx::query_as::<_, BugReportRow>(
        "SELECT * FROM bug_reports WHERE external_user_id = $1 ORDER BY created_at DESC",
    )
    .bind(external_user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_bug_reports(db: &PgPool) -> Result<Vec<BugReportRow>, AppError> {
    let rows = sqlx::query_as::<_, BugReportRow>(
        "SELECT * FROM bug_reports ORDER BY created_at DESC LIMIT $1",
    )
    .bind(ADMIN_LIST_LIMIT)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_bug_report(db: &PgPool, id: Uuid) -> Result<BugReportRow, AppError> {
    sqlx::query_as::<_, BugReportRow>("SELECT * FROM bug_reports WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bug not found".to_string()))
}

pub async fn update_bug_report(
    db: &PgPool,
    id: Uuid,
    update: &BugReportUpdate,
) -> Result<BugReportRow, AppError> {
    let (set_comment, comment) = match &update.admin_comment {
        Some(comment) => (true, comment.as_deref()),
        None => (false, None),
    };
    sqlx::query_as::<_, BugReportRow>(
        r#"
        UPDATE bug_reports
        SET status = COALESCE($1, status),
            admin_comment = CASE WHEN $2 THEN $3 ELSE admin_comment END,
            updated_at = now()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(update.status.map(|s| s.as_str()))
    .bind(set_comment)
    .bind(comment)
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Bug not found".to_string()))
}

pub async fn insert_feedback(
    db: &PgPool,
    external_user_id: Option<&str>,
    feedback: &NewFeedback,
) -> Result<FeedbackRow, AppError> {
    let row = sqlx::query_as::<_, FeedbackRow>(
        r#"
        INSERT INTO feedback (external_user_id, email, rating, mood, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(external_user_id)
    .bind(feedback.email.as_deref())
    .bind(feedback.rating)
    .bind(feedback.mood.as_deref())
    .bind(feedback.message.as_deref())
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_feedback(db: &PgPool) -> Result<Vec<FeedbackRow>, AppError> {
    let rows = sqlx::query_as::<_, FeedbackRow>(
        "SELECT * FROM feedback ORDER BY created_at DESC LIMIT $1",
    )
    .bind(ADMIN_LIST_LIMIT)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn reply_to_feedback(
    db: &PgPool,
    id: Uuid,
    reply: Option<&str>,
) -> Result<FeedbackRow, AppError> {
    sqlx::query_as::<_, FeedbackRow>(
        r#"
        UPDATE feedback
        SET admin_reply = $1, updated_at = now()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(reply)
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Feedback not found".to_string()))
}
