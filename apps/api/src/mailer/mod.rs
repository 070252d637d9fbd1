//! Transactional email through an HTTP mail API (Resend-compatible JSON
//! body). All mail goes through the [`Mailer`] trait so handlers can treat
//! delivery as best-effort and tests can record what would be sent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::MailConfig;

pub mod templates;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gave up after {retries} retries")]
    Exhausted { retries: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Result<Self, MailError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    /// Retries on 429 and 5xx responses with exponential backoff.
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let body = SendRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let mut last_error: Option<MailError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Mail send attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(MailError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                warn!("Mail API returned {status}: {text}");
                last_error = Some(MailError::Api {
                    status: status.as_u16(),
                    message: text,
                });
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(MailError::Api {
                    status: status.as_u16(),
                    message: text,
                });
            }

            debug!("Mail sent to {}", message.to);
            return Ok(());
        }

        Err(last_error.unwrap_or(MailError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}

/// Used when no mail API key is configured: messages are logged and dropped.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(
            "Mail disabled; dropping \"{}\" to {}",
            message.subject, message.to
        );
        Ok(())
    }
}

pub fn build_mailer(config: &MailConfig) -> Result<Box<dyn Mailer>, MailError> {
    match &config.api_key {
        Some(key) => {
            info!("Mail enabled via {}", config.api_url);
            Ok(Box::new(HttpMailer::new(
                config.api_url.clone(),
                key.clone(),
                config.from.clone(),
            )?))
        }
        None => {
            warn!("MAIL_API_KEY not set; outgoing mail is disabled");
            Ok(Box::new(NoopMailer))
        }
    }
}

/// Sends and logs failures. Delivery never affects the caller's outcome.
pub async fn send_best_effort(mailer: &dyn Mailer, message: EmailMessage) {
    let to = message.to.clone();
    if let Err(e) = mailer.send(message).await {
        warn!("Failed to send notification email to {to}: {e}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records messages; optionally fails every send.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "ada@example.com".into(),
            subject: "Hello".into(),
            html: "<p>Hi</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let mailer = RecordingMailer {
            fail: true,
            ..Default::default()
        };
        send_best_effort(&mailer, message()).await;
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_best_effort_delivers() {
        let mailer = RecordingMailer::default();
        send_best_effort(&mailer, message()).await;
        assert_eq!(mailer.sent.lock().unwrap().as_slice(), &[message()]);
    }

    #[test]
    fn test_build_mailer_without_key_is_noop() {
        let config = MailConfig {
            api_url: "http://localhost".into(),
            api_key: None,
            from: "x@example.com".into(),
        };
        assert!(build_mailer(&config).is_ok());
    }

    #[test]
    fn test_request_body_shape() {
        let body = SendRequest {
            from: "a@example.com",
            to: ["b@example.com"],
            subject: "S",
            html: "<p>H</p>",
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["to"][0], "b@example.com");
        assert_eq!(value["html"], "<p>H</p>");
    }
}
