use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::document::config::ResumeConfig;
use crate::document::model::{ResumeContent, ResumeDocument, StylingBundle, DEFAULT_ZOOM};

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub content: Json<ResumeContent>,
    pub config: Json<ResumeConfig>,
    pub template: String,
    pub zoom: i16,
    pub styling: Json<StylingBundle>,
    pub revision: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    pub fn document(&self) -> ResumeDocument {
        ResumeDocument {
            content: self.content.0.clone(),
            config: self.config.0,
            template: self.template.clone(),
            zoom: u16::try_from(self.zoom).unwrap_or(DEFAULT_ZOOM),
            styling: self.styling.0.clone(),
        }
    }
}

/// A resume as returned to the editor: row metadata plus the flattened document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    pub id: Uuid,
    pub name: String,
    pub revision: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub document: ResumeDocument,
}

impl From<ResumeRow> for ResumeResponse {
    fn from(row: ResumeRow) -> Self {
        let document = row.document();
        Self {
            id: row.id,
            name: row.name,
            revision: row.revision,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            document,
        }
    }
}

/// Dashboard listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub id: Uuid,
    pub name: String,
    pub template: String,
    pub revision: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
