//! Caller identity.
//!
//! Authentication happens in the identity provider that fronts this service;
//! it forwards the verified user id in `x-auth-user-id`. These extractors
//! only read that header and resolve it against the local `users` table.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const AUTH_USER_HEADER: &str = "x-auth-user-id";
const MAX_EXTERNAL_ID_LEN: usize = 255;

/// A request carrying a verified identity-provider user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub external_id: String,
}

impl AuthUser {
    fn from_parts(parts: &Parts) -> Option<Self> {
        let raw = parts.headers.get(AUTH_USER_HEADER)?.to_str().ok()?.trim();
        if raw.is_empty() || raw.len() > MAX_EXTERNAL_ID_LEN {
            return None;
        }
        Some(Self {
            external_id: raw.to_string(),
        })
    }

    /// Resolves the caller's local user row.
    pub async fn load(&self, db: &PgPool) -> Result<User, AppError> {
        find_user(db, &self.external_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthUser::from_parts(parts).ok_or(AppError::Unauthorized)
    }
}

/// Identity for routes that are public but behave differently when signed in.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(AuthUser::from_parts(parts)))
    }
}

/// A signed-in caller listed in `ADMIN_USER_IDS`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !state.config.is_admin(&user.external_id) {
            warn!("Non-admin user {} attempted admin access", user.external_id);
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

pub async fn find_user(db: &PgPool, external_id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = $1")
        .bind(external_id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn upsert_user(
    db: &PgPool,
    external_id: &str,
    email: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (external_id, email, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (external_id) DO UPDATE
            SET email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                updated_at = now()
        RETURNING *
        "#,
    )
    .bind(external_id)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(db)
    .await?;
    Ok(user)
}
