use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::api::{ApiClient, ApiError};
use crate::reviews::comments::CommentThread;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch(&self, token: &str) -> Result<Vec<CommentThread>, ApiError>;
}

#[async_trait]
impl CommentSource for ApiClient {
    async fn fetch(&self, token: &str) -> Result<Vec<CommentThread>, ApiError> {
        Ok(self.list_comments(token).await?.threads)
    }
}

/// Refreshes a review's comment threads on a fixed interval and publishes
/// the latest list. A failed fetch keeps the previous list; a review that
/// is gone (404) or expired (410) ends polling.
pub struct CommentPoller {
    threads: watch::Receiver<Vec<CommentThread>>,
    task: JoinHandle<()>,
}

impl CommentPoller {
    pub fn spawn(source: Arc<dyn CommentSource>, token: String, every: Duration) -> Self {
        let (tx, threads) = watch::channel(Vec::new());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match source.fetch(&token).await {
                    Ok(latest) => {
                        tx.send_if_modified(|current| {
                            if *current == latest {
                                false
                            } else {
                                *current = latest;
                                true
                            }
                        });
                    }
                    Err(ApiError::Api { status, message }) if review_gone(status) => {
                        info!("Review is no longer available ({status}): {message}; stopping poller");
                        break;
                    }
                    Err(e) => warn!("Comment refresh failed: {e}"),
                }
                if tx.is_closed() {
                    debug!("No comment subscribers left; stopping poller");
                    break;
                }
            }
        });
        Self { threads, task }
    }

    pub fn threads(&self) -> watch::Receiver<Vec<CommentThread>> {
        self.threads.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

fn review_gone(status: u16) -> bool {
    matches!(status, 404 | 410)
}
