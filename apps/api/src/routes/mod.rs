pub mod health;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::rate_limit::rate_limit;
use crate::resumes::handlers as resumes;
use crate::reviews::handlers as reviews;
use crate::state::AppState;
use crate::support::handlers as support;

/// Leaves room for multipart framing around a 10 MiB PDF so the handler,
/// not the body limit, reports an oversized file.
pub const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/users/sync", post(users::handle_sync_user))
        // Resume documents
        .route(
            "/api/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/api/resumes/:id",
            get(resumes::handle_get_resume)
                .put(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route("/api/resumes/:id/sections", get(resumes::handle_get_sections))
        .route("/api/resumes/:id/preview", get(resumes::handle_preview))
        // Support
        .route(
            "/api/bug-report",
            post(support::handle_create_bug_report).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/user/bug-reports",
            get(support::handle_list_own_bug_reports),
        )
        .route("/api/feedback", post(support::handle_create_feedback))
        // Admin
        .route(
            "/api/admin/bug-reports",
            get(support::handle_admin_list_bug_reports),
        )
        .route(
            "/api/admin/bug-reports/:id",
            get(support::handle_admin_get_bug_report)
                .patch(support::handle_admin_update_bug_report),
        )
        .route("/api/admin/feedback", get(support::handle_admin_list_feedback))
        .route(
            "/api/admin/feedback/:id",
            patch(support::handle_admin_reply_feedback),
        )
        // Resume reviews
        .route(
            "/api/review-resume",
            get(reviews::handle_list_reviews)
                .post(reviews::handle_upload_review)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/review-resume/:id",
            get(reviews::handle_get_review).delete(reviews::handle_delete_review),
        )
        .route(
            "/api/review-resume/public/:token",
            get(reviews::handle_get_public_review),
        )
        .route(
            "/api/review-resume/public/:token/comments",
            get(reviews::handle_list_comments).post(reviews::handle_create_comment),
        )
        .route(
            "/api/review-resume/comments/:comment_id",
            put(reviews::handle_update_comment).delete(reviews::handle_delete_comment),
        )
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}
