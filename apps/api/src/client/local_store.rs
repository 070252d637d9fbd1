//! Preferences the editor keeps on the user's machine: section order, a
//! draft written before sign-in, and the dashboard's view and sort choices.
//!
//! The state is one JSON file. A missing or unreadable file yields the
//! defaults; a bad section order falls back to the default order.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::model::{ResumeContent, ResumeDocument};
use crate::document::order::SectionOrder;
use crate::models::resume::ResumeSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    UpdatedNewest,
    UpdatedOldest,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub fn sort(self, resumes: &mut [ResumeSummary]) {
        match self {
            SortOrder::Newest => resumes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => resumes.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::UpdatedNewest => resumes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            SortOrder::UpdatedOldest => resumes.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
            SortOrder::NameAsc => {
                resumes.sort_by_key(|r| r.name.to_lowercase());
            }
            SortOrder::NameDesc => {
                resumes.sort_by_key(|r| std::cmp::Reverse(r.name.to_lowercase()));
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalState {
    /// Raw JSON array of section ids, as last written.
    section_order: Option<String>,
    /// Resume edited before signing in. Kept loosely typed so an old or
    /// partial draft does not invalidate the rest of the file.
    draft: Option<serde_json::Value>,
    pub view_mode: ViewMode,
    pub sort_order: SortOrder,
}

impl LocalState {
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Could not read local state {}: {e}", path.display());
                return Self::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding malformed local state {}: {e}", path.display());
            Self::default()
        })
    }

    /// Writes through a temporary file so a crash never leaves half a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let tmp = temp_path(path);
        let body = serde_json::to_string_pretty(self).context("Failed to encode local state")?;
        std::fs::write(&tmp, body).with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!("Saved local state to {}", path.display());
        Ok(())
    }

    /// The stored order reconciled against the sections that exist now.
    pub fn section_order(&self, content: &ResumeContent) -> SectionOrder {
        SectionOrder::parse_stored(self.section_order.as_deref(), content).reconcile(content)
    }

    pub fn set_section_order(&mut self, order: &SectionOrder) {
        self.section_order = Some(order.to_json());
    }

    pub fn draft(&self) -> Option<ResumeDocument> {
        let value = self.draft.clone()?;
        serde_json::from_value(value)
            .map_err(|e| debug!("Ignoring unreadable draft: {e}"))
            .ok()
    }

    pub fn set_draft(&mut self, document: &ResumeDocument) -> Result<()> {
        self.draft = Some(serde_json::to_value(document).context("Failed to encode draft")?);
        Ok(())
    }

    /// Called once the draft has been saved to an account.
    pub fn clear_draft(&mut self) {
        self.draft = None;
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::document::defaults::default_resume_content;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = LocalState::load(&dir.path().join("state.json"));
        assert_eq!(state, LocalState::default());
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let content = default_resume_content();

        let mut state = LocalState {
            view_mode: ViewMode::List,
            sort_order: SortOrder::NameAsc,
            ..Default::default()
        };
        let mut order = SectionOrder::default_for(&content);
        assert!(order.move_section("skills", "personal-info"));
        state.set_section_order(&order);
        state.save(&path).unwrap();

        let loaded = LocalState::load(&path);
        assert_eq!(loaded.view_mode, ViewMode::List);
        assert_eq!(loaded.sort_order, SortOrder::NameAsc);
        assert_eq!(loaded.section_order(&content).ids()[0], "skills");
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(LocalState::load(&path), LocalState::default());
    }

    #[test]
    fn test_bad_section_order_falls_back_to_default() {
        let content = default_resume_content();
        let state = LocalState {
            section_order: Some("[\"skills\",".to_string()),
            ..Default::default()
        };
        assert_eq!(
            state.section_order(&content),
            SectionOrder::default_for(&content)
        );
    }

    #[test]
    fn test_draft_lifecycle() {
        let mut state = LocalState::default();
        assert!(state.draft().is_none());

        let mut document = ResumeDocument::default();
        document.content.first_name = "Ada".into();
        state.set_draft(&document).unwrap();
        assert_eq!(state.draft().unwrap().content.first_name, "Ada");

        state.clear_draft();
        assert!(state.draft().is_none());
    }

    #[test]
    fn test_sort_orders() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let summary = |name: &str, created: i64, updated: i64| ResumeSummary {
            id: Uuid::new_v4(),
            name: name.to_string(),
            template: "default".into(),
            revision: 1,
            is_active: true,
            created_at: base + Duration::days(created),
            updated_at: base + Duration::days(updated),
        };
        let mut resumes = vec![
            summary("beta", 1, 5),
            summary("Alpha", 2, 3),
            summary("gamma", 0, 9),
        ];
        let names = |r: &[ResumeSummary]| r.iter().map(|s| s.name.clone()).collect::<Vec<_>>();

        SortOrder::Newest.sort(&mut resumes);
        assert_eq!(names(&resumes), ["Alpha", "beta", "gamma"]);
        SortOrder::UpdatedNewest.sort(&mut resumes);
        assert_eq!(names(&resumes), ["gamma", "beta", "Alpha"]);
        SortOrder::NameAsc.sort(&mut resumes);
        assert_eq!(names(&resumes), ["Alpha", "beta", "gamma"]);
        SortOrder::NameDesc.sort(&mut resumes);
        assert_eq!(names(&resumes), ["gamma", "beta", "Alpha"]);
        SortOrder::Oldest.sort(&mut resumes);
        assert_eq!(names(&resumes), ["gamma", "beta", "Alpha"]);
    }

    #[test]
    fn test_preferences_use_wire_names() {
        let value = serde_json::to_value(LocalState {
            sort_order: SortOrder::UpdatedOldest,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["sortOrder"], "updated-oldest");
        assert_eq!(value["viewMode"], "grid");
    }
}
