use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::mailer::Mailer;
use crate::rate_limit::RateLimiter;
use crate::reviews::store::ReviewStore;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Review links and their comments. Postgres in production.
    pub reviews: Arc<dyn ReviewStore>,
    /// PDF and screenshot uploads. S3 in production.
    pub storage: Arc<dyn ObjectStore>,
    /// Transactional email. Falls back to a logging no-op when mail is unconfigured.
    pub mailer: Arc<dyn Mailer>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub config: Config,
}
