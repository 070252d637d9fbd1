//! Persistence for reviews and their comments.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::review::{CommentRow, ReviewRow};

pub struct NewReview<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub pdf_key: &'a str,
    pub pdf_url: &'a str,
    pub share_token: &'a str,
}

pub struct NewComment<'a> {
    pub review_id: Uuid,
    pub user_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub comment_text: &'a str,
    pub reviewer_name: &'a str,
    pub reviewer_email: &'a str,
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_reviews(&self, user_id: Uuid) -> Result<Vec<ReviewRow>, AppError>;
    async fn insert_review(&self, review: &NewReview<'_>) -> Result<ReviewRow, AppError>;
    async fn get_owned_review(&self, id: Uuid, user_id: Uuid) -> Result<ReviewRow, AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<ReviewRow>, AppError>;
    /// Hard delete; comments go with it.
    async fn delete_review(&self, id: Uuid) -> Result<(), AppError>;

    /// Oldest first.
    async fn list_comments(&self, review_id: Uuid) -> Result<Vec<CommentRow>, AppError>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<CommentRow>, AppError>;
    async fn insert_comment(&self, comment: &NewComment<'_>) -> Result<CommentRow, AppError>;
    async fn update_comment_text(&self, id: Uuid, text: &str) -> Result<CommentRow, AppError>;
    /// Replies go with their parent.
    async fn delete_comment(&self, id: Uuid) -> Result<(), AppError>;
}

pub struct PgReviewStore {
    db: PgPool,
}

impl PgReviewStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_reviews(&self, user_id: Uuid) -> Result<Vec<ReviewRow>, AppError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT * FROM resume_reviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_review(&self, review: &NewReview<'_>) -> Result<ReviewRow, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO resume_reviews (user_id, title, pdf_key, pdf_url, share_token, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING *
            "#,
        )
        .bind(review.user_id)
        .bind(review.title)
        .bind(review.pdf_key)
        .bind(review.pdf_url)
        .bind(review.share_token)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn get_owned_review(&self, id: Uuid, user_id: Uuid) -> Result<ReviewRow, AppError> {
        sqlx::query_as::<_, ReviewRow>(
            "SELECT * FROM resume_reviews WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ReviewRow>, AppError> {
        let row =
            sqlx::query_as::<_, ReviewRow>("SELECT * FROM resume_reviews WHERE share_token = $1")
                .bind(token)
                .fetch_optional(&self.db)
                .await?;
        Ok(row)
    }

    async fn delete_review(&self, id: Uuid) -> Result<(), AppError> {
        // Comments are removed by ON DELETE CASCADE.
        sqlx::query("DELETE FROM resume_reviews WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn list_comments(&self, review_id: Uuid) -> Result<Vec<CommentRow>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT * FROM resume_review_comments WHERE review_id = $1 ORDER BY created_at ASC",
        )
        .bind(review_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<CommentRow>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT * FROM resume_review_comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert_comment(&self, comment: &NewComment<'_>) -> Result<CommentRow, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO resume_review_comments
                (review_id, user_id, parent_comment_id, comment_text, reviewer_name, reviewer_email)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(comment.review_id)
        .bind(comment.user_id)
        .bind(comment.parent_comment_id)
        .bind(comment.comment_text)
        .bind(comment.reviewer_name)
        .bind(comment.reviewer_email)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_comment_text(&self, id: Uuid, text: &str) -> Result<CommentRow, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            UPDATE resume_review_comments
            SET comment_text = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(text)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), AppError> {
        // Replies are removed by the cascade on `parent_comment_id`.
        sqlx::query("DELETE FROM resume_review_comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Keeps reviews and comments in process memory. Used by tests.
#[derive(Default)]
pub struct MemoryReviewStore {
    reviews: Mutex<Vec<ReviewRow>>,
    comments: Mutex<Vec<CommentRow>>,
}

fn poisoned() -> AppError {
    AppError::Internal(anyhow::anyhow!("review store lock poisoned"))
}

impl MemoryReviewStore {
    pub fn review_count(&self) -> usize {
        self.reviews.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Adds a fully formed row, e.g. one that has already expired.
    pub fn seed(&self, review: ReviewRow) {
        if let Ok(mut reviews) = self.reviews.lock() {
            reviews.push(review);
        }
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn list_reviews(&self, user_id: Uuid) -> Result<Vec<ReviewRow>, AppError> {
        let mut rows: Vec<ReviewRow> = self
            .reviews
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_review(&self, review: &NewReview<'_>) -> Result<ReviewRow, AppError> {
        let now = Utc::now();
        let row = ReviewRow {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            title: review.title.to_string(),
            pdf_key: review.pdf_key.to_string(),
            pdf_url: review.pdf_url.to_string(),
            share_token: review.share_token.to_string(),
            is_active: true,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        self.reviews.lock().map_err(|_| poisoned())?.push(row.clone());
        Ok(row)
    }

    async fn get_owned_review(&self, id: Uuid, user_id: Uuid) -> Result<ReviewRow, AppError> {
        self.reviews
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ReviewRow>, AppError> {
        Ok(self
            .reviews
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .find(|r| r.share_token == token)
            .cloned())
    }

    async fn delete_review(&self, id: Uuid) -> Result<(), AppError> {
        self.reviews.lock().map_err(|_| poisoned())?.retain(|r| r.id != id);
        self.comments
            .lock()
            .map_err(|_| poisoned())?
            .retain(|c| c.review_id != id);
        Ok(())
    }

    async fn list_comments(&self, review_id: Uuid) -> Result<Vec<CommentRow>, AppError> {
        let mut rows: Vec<CommentRow> = self
            .comments
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<CommentRow>, AppError> {
        Ok(self
            .comments
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn insert_comment(&self, comment: &NewComment<'_>) -> Result<CommentRow, AppError> {
        let now = Utc::now();
        let row = CommentRow {
            id: Uuid::new_v4(),
            review_id: comment.review_id,
            user_id: Some(comment.user_id),
            parent_comment_id: comment.parent_comment_id,
            comment_text: comment.comment_text.to_string(),
            reviewer_name: Some(comment.reviewer_name.to_string()),
            reviewer_email: Some(comment.reviewer_email.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.comments.lock().map_err(|_| poisoned())?.push(row.clone());
        Ok(row)
    }

    async fn update_comment_text(&self, id: Uuid, text: &str) -> Result<CommentRow, AppError> {
        let mut comments = self.comments.lock().map_err(|_| poisoned())?;
        let comment = comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        comment.comment_text = text.to_string();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), AppError> {
        self.comments
            .lock()
            .map_err(|_| poisoned())?
            .retain(|c| c.id != id && c.parent_comment_id != Some(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_comment(review_id: Uuid, parent: Option<Uuid>, text: &str) -> NewComment<'_> {
        NewComment {
            review_id,
            user_id: Uuid::from_u128(1),
            parent_comment_id: parent,
            comment_text: text,
            reviewer_name: "Ada",
            reviewer_email: "ada@example.com",
        }
    }

    #[tokio::test]
    async fn test_memory_store_review_lifecycle() {
        let store = MemoryReviewStore::default();
        let owner = Uuid::from_u128(1);
        let review = store
            .insert_review(&NewReview {
                user_id: owner,
                title: "CV",
                pdf_key: "k",
                pdf_url: "http://objects/k",
                share_token: "t",
            })
            .await
            .unwrap();

        assert!(review.is_active);
        assert_eq!(store.find_by_token("t").await.unwrap().unwrap().id, review.id);
        assert!(matches!(
            store.get_owned_review(review.id, Uuid::from_u128(2)).await,
            Err(AppError::NotFound(_))
        ));

        store
            .insert_comment(&new_comment(review.id, None, "nice"))
            .await
            .unwrap();
        store.delete_review(review.id).await.unwrap();
        assert_eq!(store.review_count(), 0);
        assert!(store.list_comments(review.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_deleting_comment_removes_replies() {
        let store = MemoryReviewStore::default();
        let review_id = Uuid::from_u128(9);
        let root = store
            .insert_comment(&new_comment(review_id, None, "root"))
            .await
            .unwrap();
        store
            .insert_comment(&new_comment(review_id, Some(root.id), "reply"))
            .await
            .unwrap();
        let other = store
            .insert_comment(&new_comment(review_id, None, "other"))
            .await
            .unwrap();

        store.delete_comment(root.id).await.unwrap();
        let left = store.list_comments(review_id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, other.id);
    }
}
