use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{find_user, AdminUser, AuthUser, OptionalAuthUser};
use crate::errors::AppError;
use crate::mailer::{send_best_effort, templates};
use crate::models::support::{BugReportRow, FeedbackRow};
use crate::state::AppState;
use crate::support::requests::{
    BugReportUpdateRequest, FeedbackReplyRequest, FeedbackRequest, NewBugReport,
};
use crate::support::store;
use crate::upload::{
    detect_image_type, image_extension, read_form, UploadedFile, MAX_SCREENSHOT_BYTES,
};

const ADMIN_LIST_CACHE: &str = "public, s-maxage=30, stale-while-revalidate=60";

#[derive(Serialize)]
pub struct BugReportResponse {
    pub bug: BugReportRow,
}

#[derive(Serialize)]
pub struct BugReportListResponse {
    pub bugs: Vec<BugReportRow>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub feedback: FeedbackRow,
}

#[derive(Serialize)]
pub struct FeedbackListResponse {
    pub feedback: Vec<FeedbackRow>,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))
}

pub fn screenshot_object_key(millis: i64, id: Uuid, mime: &str) -> String {
    format!("bug-screenshots/{millis}-{id}.{}", image_extension(mime))
}

/// Rejects anything that does not sniff as an image.
fn screenshot_type(file: &UploadedFile) -> Result<&'static str, AppError> {
    detect_image_type(&file.bytes)
        .ok_or_else(|| AppError::Validation("Screenshot must be an image".to_string()))
}

async fn store_screenshot(state: &AppState, file: &UploadedFile, mime: &str) -> Option<String> {
    let key = screenshot_object_key(Utc::now().timestamp_millis(), Uuid::new_v4(), mime);
    match state.storage.put(&key, file.bytes.clone(), mime).await {
        Ok(()) => Some(state.config.public_object_url(&key)),
        Err(e) => {
            warn!("Screenshot upload failed, saving report without it: {e}");
            None
        }
    }
}

/// POST /api/bug-report (multipart: `description`, `pageUrl`, `email`, `screenshot`)
pub async fn handle_create_bug_report(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BugReportResponse>), AppError> {
    let form = read_form(
        multipart,
        "screenshot",
        MAX_SCREENSHOT_BYTES,
        "Screenshot must be less than 5MB",
    )
    .await?;
    let mut report = NewBugReport::validate(
        form.text("description"),
        form.text("pageUrl"),
        form.text("email"),
    )?;
    let screenshot = match &form.file {
        Some(file) => Some((file, screenshot_type(file)?)),
        None => None,
    };

    let external_id = auth.map(|a| a.external_id);
    if report.email.is_none() {
        if let Some(id) = external_id.as_deref() {
            report.email = find_user(&state.db, id).await?.map(|u| u.email);
        }
    }

    let screenshot_url = match screenshot {
        Some((file, mime)) => store_screenshot(&state, file, mime).await,
        None => None,
    };

    let bug = store::insert_bug_report(
        &state.db,
        external_id.as_deref(),
        &report,
        screenshot_url.as_deref(),
    )
    .await?;
    info!("Bug report {} submitted", bug.id);
    Ok((StatusCode::CREATED, Json(BugReportResponse { bug })))
}

/// GET /api/user/bug-reports
pub async fn handle_list_own_bug_reports(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BugReportListResponse>, AppError> {
    let bugs = store::list_bug_reports_for_user(&state.db, &auth.external_id).await?;
    Ok(Json(BugReportListResponse { bugs }))
}

/// POST /api/feedback
pub async fn handle_create_feedback(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    let feedback = parse_body::<FeedbackRequest>(body)?.validate()?;
    let external_id = auth.map(|a| a.external_id);
    let feedback = store::insert_feedback(&state.db, external_id.as_deref(), &feedback).await?;
    info!("Feedback {} submitted", feedback.id);
    Ok((StatusCode::CREATED, Json(FeedbackResponse { feedback })))
}

// ────────────────────────────────────────────────────────────────────────────
// Admin endpoints
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/admin/bug-reports
pub async fn handle_admin_list_bug_reports(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let bugs = store::list_bug_reports(&state.db).await?;
    let mut response = Json(BugReportListResponse { bugs }).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(ADMIN_LIST_CACHE),
    );
    Ok(response)
}

/// GET /api/admin/bug-reports/:id
pub async fn handle_admin_get_bug_report(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BugReportResponse>, AppError> {
    let bug = store::get_bug_report(&state.db, id).await?;
    Ok(Json(BugReportResponse { bug }))
}

/// PATCH /api/admin/bug-reports/:id
///
/// Notifies the reporter by email when the report has one.
pub async fn handle_admin_update_bug_report(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<BugReportResponse>, AppError> {
    let update = parse_body::<BugReportUpdateRequest>(body)?.validate()?;
    let bug = store::update_bug_report(&state.db, id, &update).await?;
    info!(
        "Bug report {id} updated by {} (status {})",
        admin.external_id, bug.status
    );

    if let Some(message) = templates::bug_report_update(&bug, &state.config.app_base_url) {
        send_best_effort(state.mailer.as_ref(), message).await;
    }
    Ok(Json(BugReportResponse { bug }))
}

/// GET /api/admin/feedback
pub async fn handle_admin_list_feedback(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<FeedbackListResponse>, AppError> {
    let feedback = store::list_feedback(&state.db).await?;
    Ok(Json(FeedbackListResponse { feedback }))
}

/// PATCH /api/admin/feedback/:id
pub async fn handle_admin_reply_feedback(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let reply = parse_body::<FeedbackReplyRequest>(body)?.validate()?;
    let feedback = store::reply_to_feedback(&state.db, id, reply.as_deref()).await?;
    info!("Feedback {id} answered by {}", admin.external_id);

    if feedback.admin_reply.is_some() {
        if let Some(message) = templates::feedback_reply(&feedback) {
            send_best_effort(state.mailer.as_ref(), message).await;
        }
    }
    Ok(Json(FeedbackResponse { feedback }))
}
