use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthUser, OptionalAuthUser};
use crate::document::sanitize::plain_text;
use crate::errors::AppError;
use crate::models::review::{CommentRow, PublicReview, ReviewRow};
use crate::reviews::comments::{
    build_threads, ensure_available, ensure_comment_owner, normalize_comment_text, thread_root,
    CommentThread,
};
use crate::reviews::store::{NewComment, NewReview};
use crate::reviews::token::{generate_share_token, is_well_formed};
use crate::state::AppState;
use crate::storage::sanitize_file_name;
use crate::upload::{read_form, validate_pdf, MAX_PDF_BYTES};

const DEFAULT_REVIEW_TITLE: &str = "Untitled Review";
const MAX_TITLE_CHARS: usize = 255;

#[derive(Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewRow>,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub review: ReviewRow,
}

#[derive(Serialize)]
pub struct PublicReviewResponse {
    pub review: PublicReview,
}

#[derive(Serialize, Deserialize)]
pub struct CommentListResponse {
    pub threads: Vec<CommentThread>,
    /// Lets the viewer's client show edit/delete on their own comments.
    pub current_user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub comment: CommentRow,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub comment_text: Option<String>,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub comment_text: Option<String>,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))
}

pub fn review_object_key(user_id: Uuid, millis: i64, file_name: &str) -> String {
    format!(
        "resume-reviews/{user_id}/{millis}-{}",
        sanitize_file_name(file_name)
    )
}

async fn load_shared_review(state: &AppState, token: &str) -> Result<ReviewRow, AppError> {
    if !is_well_formed(token) {
        return Err(AppError::NotFound("Review not found".to_string()));
    }
    let review = state
        .reviews
        .find_by_token(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
    ensure_available(&review, Utc::now())?;
    Ok(review)
}

// ────────────────────────────────────────────────────────────────────────────
// Owner endpoints
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/review-resume
pub async fn handle_list_reviews(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ReviewListResponse>, AppError> {
    let user = auth.load(&state.db).await?;
    let reviews = state.reviews.list_reviews(user.id).await?;
    Ok(Json(ReviewListResponse { reviews }))
}

/// POST /api/review-resume (multipart: `title`, `file`)
///
/// The file is checked before anything is written: no object is stored and
/// no row is created for a rejected upload.
pub async fn handle_upload_review(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let form = read_form(
        multipart,
        "file",
        MAX_PDF_BYTES,
        "File size must be less than 10MB",
    )
    .await?;
    let file = form
        .file
        .clone()
        .ok_or_else(|| AppError::Validation("PDF file is required".to_string()))?;
    validate_pdf(&file)?;

    let title = form
        .text("title")
        .map(plain_text)
        .filter(|t| !t.is_empty())
        .map(|t| t.chars().take(MAX_TITLE_CHARS).collect::<String>())
        .unwrap_or_else(|| DEFAULT_REVIEW_TITLE.to_string());

    let user = auth.load(&state.db).await?;
    let key = review_object_key(user.id, Utc::now().timestamp_millis(), &file.file_name);
    state
        .storage
        .put(&key, file.bytes.clone(), "application/pdf")
        .await?;

    let pdf_url = state.config.public_object_url(&key);
    let share_token = generate_share_token();
    let inserted = state
        .reviews
        .insert_review(&NewReview {
            user_id: user.id,
            title: &title,
            pdf_key: &key,
            pdf_url: &pdf_url,
            share_token: &share_token,
        })
        .await;

    let review = match inserted {
        Ok(review) => review,
        Err(e) => {
            error!("Failed to create review row, removing uploaded object {key}");
            if let Err(cleanup) = state.storage.delete(&key).await {
                warn!("Failed to remove orphaned object {key}: {cleanup}");
            }
            return Err(e);
        }
    };

    info!("Created review {} for user {}", review.id, user.id);
    Ok((StatusCode::CREATED, Json(ReviewResponse { review })))
}

/// GET /api/review-resume/:id
pub async fn handle_get_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let user = auth.load(&state.db).await?;
    let review = state.reviews.get_owned_review(id, user.id).await?;
    Ok(Json(ReviewResponse { review }))
}

/// DELETE /api/review-resume/:id
pub async fn handle_delete_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user = auth.load(&state.db).await?;
    let review = state.reviews.get_owned_review(id, user.id).await?;

    if let Err(e) = state.storage.delete(&review.pdf_key).await {
        warn!("Failed to delete stored PDF {}: {e}", review.pdf_key);
    }
    state.reviews.delete_review(review.id).await?;
    info!("Deleted review {id}");
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Share-link endpoints
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/review-resume/public/:token
pub async fn handle_get_public_review(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicReviewResponse>, AppError> {
    let review = load_shared_review(&state, &token).await?;
    Ok(Json(PublicReviewResponse {
        review: review.into(),
    }))
}

/// GET /api/review-resume/public/:token/comments
pub async fn handle_list_comments(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Path(token): Path<String>,
) -> Result<Json<CommentListResponse>, AppError> {
    let review = load_shared_review(&state, &token).await?;
    let current_user_id = match auth {
        Some(auth) => crate::auth::find_user(&state.db, &auth.external_id)
            .await?
            .map(|u| u.id),
        None => None,
    };
    let comments = state.reviews.list_comments(review.id).await?;
    Ok(Json(CommentListResponse {
        threads: build_threads(comments),
        current_user_id,
    }))
}

/// POST /api/review-resume/public/:token/comments
pub async fn handle_create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(token): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let req: CreateCommentRequest = parse_body(body)?;
    let text = normalize_comment_text(req.comment_text.as_deref())?;

    let user = auth.load(&state.db).await?;
    let review = load_shared_review(&state, &token).await?;

    let parent_comment_id = match req.parent_comment_id {
        Some(parent_id) => {
            let parent = state
                .reviews
                .find_comment(parent_id)
                .await?
                .filter(|p| p.review_id == review.id)
                .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
            Some(thread_root(&parent))
        }
        None => None,
    };

    let reviewer_name = user.display_name().unwrap_or_else(|| user.email.clone());
    let comment = state
        .reviews
        .insert_comment(&NewComment {
            review_id: review.id,
            user_id: user.id,
            parent_comment_id,
            comment_text: &text,
            reviewer_name: &reviewer_name,
            reviewer_email: &user.email,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse { comment })))
}

/// PUT /api/review-resume/comments/:comment_id
pub async fn handle_update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<CommentResponse>, AppError> {
    let req: UpdateCommentRequest = parse_body(body)?;
    let text = normalize_comment_text(req.comment_text.as_deref())?;

    let user = auth.load(&state.db).await?;
    let existing = state
        .reviews
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
    ensure_comment_owner(&existing, user.id)?;

    let comment = state.reviews.update_comment_text(comment_id, &text).await?;
    Ok(Json(CommentResponse { comment }))
}

/// DELETE /api/review-resume/comments/:comment_id
pub async fn handle_delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user = auth.load(&state.db).await?;
    let existing = state
        .reviews
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
    ensure_comment_owner(&existing, user.id)?;

    state.reviews.delete_comment(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
