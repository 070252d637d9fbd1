use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::{upsert_user, AuthUser};
use crate::document::sanitize::plain_text;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::support::requests::normalize_email;

const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SyncedProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn name_part(raw: Option<String>) -> Option<String> {
    raw.map(|n| plain_text(n.trim()))
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().take(MAX_NAME_CHARS).collect())
}

impl SyncUserRequest {
    pub fn validate(self) -> Result<SyncedProfile, AppError> {
        let email = normalize_email(self.email.as_deref())?
            .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
        Ok(SyncedProfile {
            email,
            first_name: name_part(self.first_name),
            last_name: name_part(self.last_name),
        })
    }
}

#[derive(Serialize)]
pub struct SyncUserResponse {
    pub user: User,
}

/// POST /api/users/sync
///
/// Creates or refreshes the local row for the identity-provider user.
pub async fn handle_sync_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<Value>,
) -> Result<Json<SyncUserResponse>, AppError> {
    let req: SyncUserRequest =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    let profile = req.validate()?;
    let user = upsert_user(
        &state.db,
        &auth.external_id,
        &profile.email,
        profile.first_name.as_deref(),
        profile.last_name.as_deref(),
    )
    .await?;
    info!("Synced user {} ({})", user.id, auth.external_id);
    Ok(Json(SyncUserResponse { user }))
}
