use std::collections::HashSet;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base URL objects are publicly served from, e.g. a CDN in front of the bucket.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Identity-provider user ids allowed onto the admin endpoints.
    pub admin_user_ids: HashSet<String>,
    pub mail: MailConfig,
    pub app_base_url: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    /// Mail is disabled when no key is configured.
    pub api_key: Option<String>,
    pub from: String,
}

const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_MAIL_FROM: &str = "Resume Builder <noreply@example.com>";
const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_public_url: require_env("S3_PUBLIC_URL")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            admin_user_ids: parse_admin_ids(&std::env::var("ADMIN_USER_IDS").unwrap_or_default()),
            mail: MailConfig {
                api_url: optional_env("MAIL_API_URL")
                    .unwrap_or_else(|| DEFAULT_MAIL_API_URL.to_string()),
                api_key: optional_env("MAIL_API_KEY"),
                from: optional_env("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            },
            app_base_url: optional_env("APP_BASE_URL")
                .unwrap_or_else(|| DEFAULT_APP_BASE_URL.to_string()),
        })
    }

    pub fn is_admin(&self, external_id: &str) -> bool {
        self.admin_user_ids.contains(external_id)
    }

    /// Public URL for a stored object key.
    pub fn public_object_url(&self, key: &str) -> String {
        format!("{}/{}", self.s3_public_url.trim_end_matches('/'), key)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Comma-separated ids; blanks are ignored.
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/resume_test".to_string(),
        redis_url: None,
        s3_bucket: "resumes".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_public_url: "https://cdn.example.com/".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        port: 8080,
        rust_log: "debug".to_string(),
        admin_user_ids: parse_admin_ids("admin_1"),
        mail: MailConfig {
            api_url: DEFAULT_MAIL_API_URL.to_string(),
            api_key: None,
            from: DEFAULT_MAIL_FROM.to_string(),
        },
        app_base_url: DEFAULT_APP_BASE_URL.to_string(),
    }
}
