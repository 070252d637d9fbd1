//! HTTP client for the resume API, used by the editor-side tasks.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::auth::AUTH_USER_HEADER;
use crate::document::model::ResumeDocument;
use crate::models::resume::{ResumeResponse, ResumeSummary};
use crate::resumes::handlers::ResumeListResponse;
use crate::reviews::handlers::CommentListResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The server holds a newer revision than the one sent.
    #[error("Conflict: {0}")]
    Conflict(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Body of a full-document save.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub name: String,
    pub revision: i64,
    #[serde(flatten)]
    pub document: ResumeDocument,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    user_id: Option<String>,
}

impl ApiClient {
    /// `user_id` is the identity-provider id forwarded as `x-auth-user-id`;
    /// `None` for anonymous share-link visitors.
    pub fn new(base_url: impl Into<String>, user_id: Option<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_identity(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.user_id {
            Some(id) => request.header(AUTH_USER_HEADER, id),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.with_identity(request).send().await?;
        decode(response).await
    }

    pub async fn list_resumes(&self) -> Result<Vec<ResumeSummary>, ApiError> {
        let list: ResumeListResponse = self.send(self.client.get(self.url("/api/resumes"))).await?;
        Ok(list.resumes)
    }

    pub async fn get_resume(&self, id: Uuid) -> Result<ResumeResponse, ApiError> {
        self.send(self.client.get(self.url(&format!("/api/resumes/{id}"))))
            .await
    }

    pub async fn save_resume(
        &self,
        id: Uuid,
        request: &SaveRequest,
    ) -> Result<ResumeResponse, ApiError> {
        debug!("Saving resume {id} at revision {}", request.revision);
        self.send(
            self.client
                .put(self.url(&format!("/api/resumes/{id}")))
                .json(request),
        )
        .await
    }

    pub async fn list_comments(&self, token: &str) -> Result<CommentListResponse, ApiError> {
        self.send(
            self.client
                .get(self.url(&format!("/api/review-resume/public/{token}/comments"))),
        )
        .await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    if status.as_u16() == 409 {
        return Err(ApiError::Conflict(message));
    }
    Err(ApiError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_request_matches_update_payload() {
        let request = SaveRequest {
            name: "Backend CV".into(),
            revision: 4,
            document: ResumeDocument::default(),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["revision"], 4);
        assert_eq!(body["name"], "Backend CV");
        assert!(body.get("document").is_none());

        // The server accepts exactly this shape.
        let payload = crate::document::validation::ResumePayload::from_json(body).unwrap();
        assert_eq!(payload.revision, Some(4));
        assert_eq!(payload.name.as_deref(), Some("Backend CV"));
    }

    #[test]
    fn test_save_of_new_resume_is_accepted() {
        use crate::document::validation::{validate_payload, ValidResume};

        let (name, document) = ValidResume::default().into_new_document();
        let request = SaveRequest {
            name,
            revision: 1,
            document,
        };
        let body = serde_json::to_value(&request).unwrap();
        let valid = crate::document::validation::ResumePayload::from_json(body)
            .and_then(validate_payload)
            .unwrap();
        assert_eq!(valid.revision, Some(1));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error":{"code":"CONFLICT","message":"Resume has a newer revision (5)"}}"#),
            "Resume has a newer revision (5)"
        );
        assert_eq!(error_message("Bad gateway"), "Bad gateway");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8080/health");
    }
}
