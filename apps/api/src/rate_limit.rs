//! Fixed-window request limiting keyed by client IP.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    pub max_requests: u64,
    pub window: Duration,
}

pub const API_POLICY: RateLimitPolicy = RateLimitPolicy {
    name: "api",
    max_requests: 100,
    window: Duration::from_secs(60),
};

pub const UPLOAD_POLICY: RateLimitPolicy = RateLimitPolicy {
    name: "upload",
    max_requests: 15,
    window: Duration::from_secs(60 * 60),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u64 },
    Limited { retry_after_secs: u64 },
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, policy: &RateLimitPolicy, key: &str) -> Decision;
}

fn decide(policy: &RateLimitPolicy, count: u64, retry_after_secs: u64) -> Decision {
    if count > policy.max_requests {
        Decision::Limited {
            retry_after_secs: retry_after_secs.max(1),
        }
    } else {
        Decision::Allowed {
            remaining: policy.max_requests - count,
        }
    }
}

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Window {
    started: Instant,
    length: Duration,
    count: u64,
}

impl Window {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.started) >= self.length
    }
}

#[derive(Default)]
struct Windows {
    entries: HashMap<String, Window>,
    last_sweep: Option<Instant>,
}

impl Windows {
    /// Drops expired windows, at most once per [`SWEEP_INTERVAL`].
    fn sweep(&mut self, now: Instant) {
        let due = self
            .last_sweep
            .map_or(true, |last| now.duration_since(last) >= SWEEP_INTERVAL);
        if due {
            self.entries.retain(|_, window| !window.expired(now));
            self.last_sweep = Some(now);
        }
    }
}

/// Per-process counters. Used when no Redis is configured.
#[derive(Default)]
pub struct MemoryRateLimiter {
    windows: Mutex<Windows>,
}

impl MemoryRateLimiter {
    /// Number of clients currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.lock().map(|w| w.entries.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check(&self, policy: &RateLimitPolicy, key: &str) -> Decision {
        let now = Instant::now();
        let Ok(mut windows) = self.windows.lock() else {
            warn!("Rate limiter state poisoned; allowing request");
            return Decision::Allowed { remaining: 0 };
        };
        windows.sweep(now);
        let window = windows
            .entries
            .entry(format!("{}:{}", policy.name, key))
            .or_insert(Window {
                started: now,
                length: policy.window,
                count: 0,
            });
        if window.expired(now) {
            window.started = now;
            window.count = 0;
        }
        window.count += 1;
        let left = policy
            .window
            .saturating_sub(now.duration_since(window.started));
        decide(policy, window.count, left.as_secs_f64().ceil() as u64)
    }
}

/// Shared counters in Redis (`INCR` + `EXPIRE`). Redis failures fail open.
pub struct RedisRateLimiter {
    client: redis::Client,
}

impl RedisRateLimiter {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn count(&self, policy: &RateLimitPolicy, key: &str) -> redis::RedisResult<(u64, i64)> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let redis_key = format!("ratelimit:{}:{}", policy.name, key);
        let (count, ttl): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&redis_key)
            .cmd("TTL")
            .arg(&redis_key)
            .query_async(&mut conn)
            .await?;
        let window_secs = policy.window.as_secs() as i64;
        if ttl < 0 {
            redis::cmd("EXPIRE")
                .arg(&redis_key)
                .arg(window_secs)
                .query_async::<_, ()>(&mut conn)
                .await?;
            return Ok((count, window_secs));
        }
        Ok((count, ttl))
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, policy: &RateLimitPolicy, key: &str) -> Decision {
        match self.count(policy, key).await {
            Ok((count, ttl)) => decide(policy, count, ttl.max(1) as u64),
            Err(e) => {
                warn!("Redis rate limiter unavailable, allowing request: {e}");
                Decision::Allowed {
                    remaining: policy.max_requests,
                }
            }
        }
    }
}

/// First hop of `x-forwarded-for`, then `x-real-ip`, else loopback.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or(real_ip)
        .unwrap_or("127.0.0.1")
        .to_string()
}

/// Upload endpoints get the hourly budget; every other API route the
/// per-minute one. Non-API paths are not limited.
pub fn policy_for(method: &Method, path: &str) -> Option<RateLimitPolicy> {
    if !path.starts_with("/api/") {
        return None;
    }
    let is_upload =
        method == Method::POST && matches!(path, "/api/review-resume" | "/api/bug-report");
    Some(if is_upload { UPLOAD_POLICY } else { API_POLICY })
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(policy) = policy_for(req.method(), req.uri().path()) else {
        return next.run(req).await;
    };
    let key = client_key(req.headers());
    match state.rate_limiter.check(&policy, &key).await {
        Decision::Allowed { .. } => next.run(req).await,
        Decision::Limited { retry_after_secs } => {
            warn!("Rate limit '{}' exceeded for {key}", policy.name);
            AppError::TooManyRequests { retry_after_secs }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: RateLimitPolicy = RateLimitPolicy {
        name: "test",
        max_requests: 3,
        window: Duration::from_secs(10),
    };

    #[tokio::test(start_paused = true)]
    async fn test_memory_limiter_blocks_after_budget() {
        let limiter = MemoryRateLimiter::default();
        for remaining in [2, 1, 0] {
            assert_eq!(
                limiter.check(&SMALL, "1.2.3.4").await,
                Decision::Allowed { remaining }
            );
        }
        assert_eq!(
            limiter.check(&SMALL, "1.2.3.4").await,
            Decision::Limited { retry_after_secs: 10 }
        );
        // Other clients have their own budget.
        assert!(matches!(
            limiter.check(&SMALL, "5.6.7.8").await,
            Decision::Allowed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_limiter_resets_after_window() {
        let limiter = MemoryRateLimiter::default();
        for _ in 0..4 {
            limiter.check(&SMALL, "k").await;
        }
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(
            limiter.check(&SMALL, "k").await,
            Decision::Limited { retry_after_secs: 6 }
        );
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(
            limiter.check(&SMALL, "k").await,
            Decision::Allowed { remaining: 2 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_limiter_evicts_expired_clients() {
        let limiter = MemoryRateLimiter::default();
        for i in 0..500 {
            limiter.check(&SMALL, &format!("10.0.{}.{}", i / 256, i % 256)).await;
        }
        assert_eq!(limiter.tracked(), 500);

        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        limiter.check(&SMALL, "192.0.2.1").await;
        assert_eq!(limiter.tracked(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_live_windows() {
        let limiter = MemoryRateLimiter::default();
        limiter.check(&UPLOAD_POLICY, "live").await;
        limiter.check(&SMALL, "short").await;
        // Past the short window and the sweep interval, inside the upload window.
        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.check(&SMALL, "other").await;
        assert_eq!(limiter.tracked(), 2);
        assert_eq!(
            limiter.check(&UPLOAD_POLICY, "live").await,
            Decision::Allowed { remaining: 13 }
        );
    }

    #[test]
    fn test_client_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "127.0.0.1");
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_key(&headers), "10.0.0.2");
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn test_policy_for() {
        assert_eq!(policy_for(&Method::GET, "/health"), None);
        assert_eq!(policy_for(&Method::GET, "/api/resumes"), Some(API_POLICY));
        assert_eq!(
            policy_for(&Method::POST, "/api/review-resume"),
            Some(UPLOAD_POLICY)
        );
        assert_eq!(
            policy_for(&Method::GET, "/api/review-resume"),
            Some(API_POLICY)
        );
        assert_eq!(policy_for(&Method::POST, "/api/bug-report"), Some(UPLOAD_POLICY));
    }
}
