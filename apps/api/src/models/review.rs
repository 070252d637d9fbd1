use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub pdf_key: String,
    pub pdf_url: String,
    pub share_token: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an anonymous visitor of a share link sees.
#[derive(Debug, Clone, Serialize)]
pub struct PublicReview {
    pub id: Uuid,
    pub title: String,
    pub pdf_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRow> for PublicReview {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            pdf_url: row.pdf_url,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub review_id: Uuid,
    pub user_id: Option<Uuid>,
    pub parent_comment_id: Option<Uuid>,
    pub comment_text: String,
    pub reviewer_name: Option<String>,
    pub reviewer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
