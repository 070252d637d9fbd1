use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_api::config::Config;
use resume_api::db::{create_pool, run_migrations};
use resume_api::mailer::{build_mailer, Mailer};
use resume_api::rate_limit::{MemoryRateLimiter, RateLimiter, RedisRateLimiter};
use resume_api::reviews::store::PgReviewStore;
use resume_api::routes::build_router;
use resume_api::state::AppState;
use resume_api::storage::{build_s3_client, S3ObjectStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let storage = Arc::new(S3ObjectStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let mailer: Arc<dyn Mailer> = Arc::from(build_mailer(&config.mail)?);

    // Shared counters when Redis is available, per-process otherwise
    let rate_limiter: Arc<dyn RateLimiter> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Rate limiting backed by Redis");
            Arc::new(RedisRateLimiter::new(client))
        }
        None => {
            info!("REDIS_URL not set; rate limiting is per-process");
            Arc::new(MemoryRateLimiter::default())
        }
    };

    // Build app state
    let state = AppState {
        reviews: Arc::new(PgReviewStore::new(db.clone())),
        db,
        storage,
        mailer,
        rate_limiter,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to APP_BASE_URL

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
