//! Debounced autosave.
//!
//! Edits are buffered and written as one full-document save once the editor
//! has been quiet for [`QUIET_INTERVAL`]. Every save carries the next
//! revision stamp, so the server can drop a save that arrives after a newer
//! one. Failures are published on the status channel and never discard the
//! editor's in-memory state. A save rejected as stale adopts the server's
//! revision and is retried once with the next stamp.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::api::{ApiClient, ApiError, SaveRequest};
use crate::document::model::ResumeDocument;

pub const QUIET_INTERVAL: Duration = Duration::from_millis(1200);

/// Where saves go. The HTTP client in production.
#[async_trait]
pub trait ResumeSink: Send + Sync {
    /// Returns the revision the server stored.
    async fn save(&self, id: Uuid, request: &SaveRequest) -> Result<i64, ApiError>;

    async fn current_revision(&self, id: Uuid) -> Result<i64, ApiError>;
}

#[async_trait]
impl ResumeSink for ApiClient {
    async fn save(&self, id: Uuid, request: &SaveRequest) -> Result<i64, ApiError> {
        Ok(self.save_resume(id, request).await?.revision)
    }

    async fn current_revision(&self, id: Uuid) -> Result<i64, ApiError> {
        Ok(self.get_resume(id).await?.revision)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub name: String,
    pub document: ResumeDocument,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    pub in_flight: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Last revision the server confirmed.
    pub revision: i64,
}

enum Event {
    Edit(Draft),
    Quiet,
    Closed,
}

pub struct DebouncedSaver {
    edits: mpsc::UnboundedSender<Draft>,
    status: watch::Receiver<SyncStatus>,
    task: JoinHandle<()>,
}

impl DebouncedSaver {
    /// Starts the save task for one resume, known to be at `revision`.
    pub fn spawn(sink: Arc<dyn ResumeSink>, resume_id: Uuid, revision: i64) -> Self {
        let (edits, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SyncStatus {
            revision,
            ..Default::default()
        });
        let task = tokio::spawn(run(sink, resume_id, rx, status_tx));
        Self {
            edits,
            status,
            task,
        }
    }

    /// Replaces the pending draft and re-arms the quiet timer.
    pub fn update(&self, draft: Draft) {
        if self.edits.send(draft).is_err() {
            warn!("Autosave task has stopped; edit not queued");
        }
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Flushes a pending draft once and stops the task.
    pub async fn close(self) -> SyncStatus {
        drop(self.edits);
        if let Err(e) = self.task.await {
            warn!("Autosave task ended abnormally: {e}");
        }
        let status = self.status.borrow().clone();
        status
    }
}

async fn run(
    sink: Arc<dyn ResumeSink>,
    resume_id: Uuid,
    mut edits: mpsc::UnboundedReceiver<Draft>,
    status: watch::Sender<SyncStatus>,
) {
    let mut pending: Option<Draft> = None;
    loop {
        let event = if pending.is_some() {
            match tokio::time::timeout(QUIET_INTERVAL, edits.recv()).await {
                Ok(Some(draft)) => Event::Edit(draft),
                Ok(None) => Event::Closed,
                Err(_) => Event::Quiet,
            }
        } else {
            match edits.recv().await {
                Some(draft) => Event::Edit(draft),
                None => Event::Closed,
            }
        };

        match event {
            Event::Edit(draft) => pending = Some(draft),
            Event::Quiet => {
                if let Some(draft) = pending.take() {
                    flush(sink.as_ref(), resume_id, draft, &status).await;
                }
            }
            Event::Closed => {
                if let Some(draft) = pending.take() {
                    flush(sink.as_ref(), resume_id, draft, &status).await;
                }
                debug!("Autosave for resume {resume_id} closed");
                break;
            }
        }
    }
}

async fn flush(
    sink: &dyn ResumeSink,
    resume_id: Uuid,
    draft: Draft,
    status: &watch::Sender<SyncStatus>,
) {
    let revision = status.borrow().revision + 1;
    status.send_modify(|s| s.in_flight = true);

    let mut request = SaveRequest {
        name: draft.name,
        revision,
        document: draft.document,
    };
    let mut result = sink.save(resume_id, &request).await;
    if matches!(result, Err(ApiError::Conflict(_))) {
        match sink.current_revision(resume_id).await {
            Ok(server) => {
                debug!("Resume {resume_id} is at revision {server} on the server; retrying");
                status.send_modify(|s| s.revision = server);
                request.revision = server + 1;
                result = sink.save(resume_id, &request).await;
            }
            Err(e) => warn!("Could not refresh revision of resume {resume_id}: {e}"),
        }
    }
    match result {
        Ok(stored) => {
            info!("Saved resume {resume_id} at revision {stored}");
            status.send_modify(|s| {
                s.in_flight = false;
                s.revision = stored;
                s.last_synced_at = Some(Utc::now());
                s.last_error = None;
            });
        }
        Err(e) => {
            warn!("Autosave of resume {resume_id} failed: {e}");
            status.send_modify(|s| {
                s.in_flight = false;
                s.last_error = Some(e.to_string());
            });
        }
    }
}
