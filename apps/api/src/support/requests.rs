//! Validation for bug reports, feedback and the admin updates to them.

use email_address::EmailAddress;
use serde::Deserialize;

use crate::document::sanitize::plain_text;
use crate::errors::AppError;
use crate::models::support::BugStatus;

const MAX_DESCRIPTION_CHARS: usize = 5000;
const MAX_URL_CHARS: usize = 2048;
const MAX_MOOD_CHARS: usize = 50;

fn bounded(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(plain_text(value))
}

/// Lowercased, trimmed, and checked when present. Blank means none.
pub fn normalize_email(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(email) = raw.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    if !EmailAddress::is_valid(&email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    Ok(Some(email))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBugReport {
    pub description: String,
    pub page_url: Option<String>,
    pub email: Option<String>,
}

impl NewBugReport {
    pub fn validate(
        description: Option<&str>,
        page_url: Option<&str>,
        email: Option<&str>,
    ) -> Result<Self, AppError> {
        let description = description.map(str::trim).unwrap_or_default();
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        Ok(Self {
            description: bounded("description", description, MAX_DESCRIPTION_CHARS)?,
            page_url: page_url
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| bounded("pageUrl", p, MAX_URL_CHARS))
                .transpose()?,
            email: normalize_email(email)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub rating: Option<i16>,
    pub mood: Option<String>,
    pub message: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub rating: Option<i16>,
    pub mood: Option<String>,
    pub message: Option<String>,
    pub email: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl FeedbackRequest {
    pub fn validate(self) -> Result<NewFeedback, AppError> {
        let mood = non_blank(self.mood);
        let message = non_blank(self.message);
        if self.rating.is_none() && mood.is_none() && message.is_none() {
            return Err(AppError::Validation("No feedback provided".to_string()));
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::Validation(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }
        Ok(NewFeedback {
            rating: self.rating,
            mood: mood.map(|m| bounded("mood", &m, MAX_MOOD_CHARS)).transpose()?,
            message: message
                .map(|m| bounded("message", &m, MAX_DESCRIPTION_CHARS))
                .transpose()?,
            email: normalize_email(self.email.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugReportUpdateRequest {
    pub status: Option<String>,
    pub admin_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugReportUpdate {
    pub status: Option<BugStatus>,
    /// `Some(None)` clears the comment.
    pub admin_comment: Option<Option<String>>,
}

impl BugReportUpdateRequest {
    pub fn validate(self) -> Result<BugReportUpdate, AppError> {
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(BugStatus::parse(raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown status '{raw}'"))
            })?),
            None => None,
        };
        if status.is_none() && self.admin_comment.is_none() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        let admin_comment = self
            .admin_comment
            .map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    Ok(None)
                } else {
                    bounded("adminComment", c, MAX_DESCRIPTION_CHARS).map(Some)
                }
            })
            .transpose()?;
        Ok(BugReportUpdate {
            status,
            admin_comment,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReplyRequest {
    pub admin_reply: Option<String>,
}

impl FeedbackReplyRequest {
    /// An empty reply clears the stored one.
    pub fn validate(self) -> Result<Option<String>, AppError> {
        let reply = self
            .admin_reply
            .ok_or_else(|| AppError::Validation("adminReply is required".to_string()))?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Ok(None);
        }
        bounded("adminReply", reply, MAX_DESCRIPTION_CHARS).map(Some)
    }
}
