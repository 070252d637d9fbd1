//! Comment threading and the access rules around reviews and comments.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::sanitize::plain_text;
use crate::errors::AppError;
use crate::models::review::{CommentRow, ReviewRow};

pub const MAX_COMMENT_CHARS: usize = 5000;

/// Trims, bounds and strips markup from comment text.
pub fn normalize_comment_text(raw: Option<&str>) -> Result<String, AppError> {
    let text = raw.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::Validation("Comment text is required".to_string()));
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(plain_text(text))
}

/// Only the author may edit or delete a comment.
pub fn ensure_comment_owner(comment: &CommentRow, user_id: Uuid) -> Result<(), AppError> {
    if comment.user_id == Some(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only modify your own comments".to_string(),
        ))
    }
}

/// A review reachable through its share link: active and not past its
/// expiry. An expired row is still kept; it is just not served.
pub fn ensure_available(review: &ReviewRow, now: DateTime<Utc>) -> Result<(), AppError> {
    if !review.is_active {
        return Err(AppError::NotFound("Review not found".to_string()));
    }
    if review.expires_at.is_some_and(|expires| expires < now) {
        return Err(AppError::Gone("This review link has expired".to_string()));
    }
    Ok(())
}

/// Threads are one level deep: replying to a reply attaches to the reply's
/// top-level comment.
pub fn thread_root(parent: &CommentRow) -> Uuid {
    parent.parent_comment_id.unwrap_or(parent.id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentRow,
    pub replies: Vec<CommentRow>,
}

/// Groups comments into top-level threads, oldest first. Replies whose
/// parent is missing are promoted to top level.
pub fn build_threads(mut comments: Vec<CommentRow>) -> Vec<CommentThread> {
    comments.sort_by_key(|c| c.created_at);
    let parents: HashMap<Uuid, Option<Uuid>> = comments
        .iter()
        .map(|c| (c.id, c.parent_comment_id))
        .collect();

    let root_of = |comment: &CommentRow| -> Option<Uuid> {
        let mut current = comment.parent_comment_id?;
        // Bounded walk; guards against cycles in legacy data.
        for _ in 0..parents.len() {
            match parents.get(&current) {
                Some(Some(next)) => current = *next,
                Some(None) => return Some(current),
                None => return None,
            }
        }
        None
    };

    let mut threads: Vec<CommentThread> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut replies: Vec<(Uuid, CommentRow)> = Vec::new();

    for comment in comments {
        match root_of(&comment) {
            Some(root) => replies.push((root, comment)),
            None => {
                index.insert(comment.id, threads.len());
                threads.push(CommentThread {
                    comment,
                    replies: Vec::new(),
                });
            }
        }
    }
    for (root, reply) in replies {
        match index.get(&root) {
            Some(&i) => threads[i].replies.push(reply),
            None => threads.push(CommentThread {
                comment: reply,
                replies: Vec::new(),
            }),
        }
    }
    threads
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn comment(id: u128, parent: Option<u128>, minute: i64, author: Option<Uuid>) -> CommentRow {
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let at = base + Duration::minutes(minute);
        CommentRow {
            id: Uuid::from_u128(id),
            review_id: Uuid::from_u128(999),
            user_id: author,
            parent_comment_id: parent.map(Uuid::from_u128),
            comment_text: format!("comment {id}"),
            reviewer_name: Some("Ada".into()),
            reviewer_email: Some("ada@example.com".into()),
            created_at: at,
            updated_at: at,
        }
    }

    fn review(expires_at: Option<DateTime<Utc>>, is_active: bool) -> ReviewRow {
        let now = Utc::now();
        ReviewRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "My CV".into(),
            pdf_key: "resume-reviews/u/1-cv.pdf".into(),
            pdf_url: "https://cdn.example.com/resume-reviews/u/1-cv.pdf".into(),
            share_token: "ab".repeat(32),
            is_active,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_comment_text_rules() {
        assert!(normalize_comment_text(None).is_err());
        assert!(normalize_comment_text(Some("   ")).is_err());
        assert_eq!(normalize_comment_text(Some("  Nice layout ")).unwrap(), "Nice layout");
        assert_eq!(
            normalize_comment_text(Some("<b>bold</b> claim")).unwrap(),
            "bold claim"
        );
        let long = "x".repeat(MAX_COMMENT_CHARS + 1);
        assert!(normalize_comment_text(Some(&long)).is_err());
    }

    #[test]
    fn test_only_author_may_modify() {
        let author = Uuid::new_v4();
        let c = comment(1, None, 0, Some(author));
        assert!(ensure_comment_owner(&c, author).is_ok());
        assert!(matches!(
            ensure_comment_owner(&c, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
        let anonymous = comment(2, None, 0, None);
        assert!(ensure_comment_owner(&anonymous, author).is_err());
    }

    #[test]
    fn test_expired_review_is_gone() {
        let past = Utc::now() - Duration::days(1);
        let err = ensure_available(&review(Some(past), true), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Gone(_)));
    }

    #[test]
    fn test_review_availability() {
        let future = Utc::now() + Duration::days(1);
        assert!(ensure_available(&review(Some(future), true), Utc::now()).is_ok());
        assert!(ensure_available(&review(None, true), Utc::now()).is_ok());
        assert!(matches!(
            ensure_available(&review(None, false), Utc::now()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_reply_to_reply_attaches_to_top_level() {
        let top = comment(1, None, 0, None);
        let reply = comment(2, Some(1), 1, None);
        assert_eq!(thread_root(&top), top.id);
        assert_eq!(thread_root(&reply), top.id);
    }

    #[test]
    fn test_build_threads() {
        let comments = vec![
            comment(3, Some(1), 5, None),
            comment(1, None, 0, None),
            comment(2, None, 1, None),
            comment(4, Some(3), 6, None), // legacy nested reply
            comment(5, Some(42), 7, None), // parent gone
            comment(6, Some(2), 2, None),
        ];
        let threads = build_threads(comments);
        let top: Vec<u128> = threads.iter().map(|t| t.comment.id.as_u128()).collect();
        assert_eq!(top, vec![1, 2, 5]);
        let first: Vec<u128> = threads[0].replies.iter().map(|r| r.id.as_u128()).collect();
        assert_eq!(first, vec![3, 4]);
        assert_eq!(threads[1].replies.len(), 1);
    }

    #[test]
    fn test_thread_serializes_flat() {
        let threads = build_threads(vec![comment(1, None, 0, None), comment(2, Some(1), 1, None)]);
        let value = serde_json::to_value(&threads).unwrap();
        assert_eq!(value[0]["comment_text"], "comment 1");
        assert_eq!(value[0]["replies"][0]["comment_text"], "comment 2");
    }
}
