use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::document::assembler::{assemble_document, AssembledSection};
use crate::document::model::ResumeContent;
use crate::document::order::SectionOrder;
use crate::document::validation::{check_document, validate_payload, ResumePayload};
use crate::errors::AppError;
use crate::models::resume::{ResumeResponse, ResumeSummary};
use crate::render::render_preview;
use crate::resumes::store::{self, check_revision, RevisionCheck};
use crate::state::AppState;

#[derive(Serialize, Deserialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeSummary>,
}

#[derive(Deserialize)]
pub struct OrderQuery {
    /// Comma-separated section ids.
    pub order: Option<String>,
}

impl OrderQuery {
    /// The requested order reconciled against the sections that exist.
    fn resolve(&self, content: &ResumeContent) -> SectionOrder {
        SectionOrder::from_query(self.order.as_deref(), content).reconcile(content)
    }
}

#[derive(Serialize)]
pub struct SectionsResponse {
    pub order: SectionOrder,
    pub sections: Vec<AssembledSection>,
}

/// GET /api/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ResumeListResponse>, AppError> {
    let user = auth.load(&state.db).await?;
    let resumes = store::list_resumes(&state.db, user.id).await?;
    Ok(Json(ResumeListResponse { resumes }))
}

/// POST /api/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ResumeResponse>), AppError> {
    let valid = validate_payload(ResumePayload::from_json(body)?)?;
    let user = auth.load(&state.db).await?;
    let (name, document) = valid.into_new_document();
    check_document(&document)?;

    let row = store::insert_resume(&state.db, user.id, &name, &document).await?;
    info!("Created resume {} for user {}", row.id, user.id);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeResponse>, AppError> {
    let user = auth.load(&state.db).await?;
    let row = store::get_resume(&state.db, id, user.id).await?;
    Ok(Json(row.into()))
}

/// PUT /api/resumes/:id
///
/// Accepts a full or partial document. A `revision` stamp that is not newer
/// than the stored one is rejected with 409 so a late autosave cannot
/// overwrite a newer edit.
pub async fn handle_update_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<ResumeResponse>, AppError> {
    let valid = validate_payload(ResumePayload::from_json(body)?)?;
    let user = auth.load(&state.db).await?;
    let current = store::get_resume(&state.db, id, user.id).await?;

    let next_revision = match check_revision(current.revision, valid.revision) {
        RevisionCheck::Apply { next } => next,
        RevisionCheck::Stale { stored } => {
            warn!("Rejected stale write to resume {id}: stored revision {stored}");
            return Err(AppError::Conflict(format!(
                "Resume has a newer revision ({stored})"
            )));
        }
    };

    let mut document = current.document();
    let name = valid
        .apply_to(&mut document)
        .unwrap_or_else(|| current.name.clone());

    let updated = store::update_resume(&state.db, &current, &name, &document, next_revision)
        .await?
        .ok_or_else(|| AppError::Conflict("Resume was modified concurrently".to_string()))?;
    Ok(Json(updated.into()))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user = auth.load(&state.db).await?;
    store::delete_resume(&state.db, id, user.id).await?;
    info!("Deleted resume {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/resumes/:id/sections?order=a,b,c
pub async fn handle_get_sections(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<SectionsResponse>, AppError> {
    let user = auth.load(&state.db).await?;
    let document = store::get_resume(&state.db, id, user.id).await?.document();
    let order = query.resolve(&document.content);
    let sections = assemble_document(&document, &order);
    Ok(Json(SectionsResponse { order, sections }))
}

/// GET /api/resumes/:id/preview?order=a,b,c
pub async fn handle_preview(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<OrderQuery>,
) -> Result<Html<String>, AppError> {
    let user = auth.load(&state.db).await?;
    let document = store::get_resume(&state.db, id, user.id).await?.document();
    let order = query.resolve(&document.content);
    Ok(Html(render_preview(&document, &order)))
}
