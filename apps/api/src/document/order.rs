//! The user's section ordering.
//!
//! Ordering is a client-side preference: it lives in the editor's local store
//! and is handed to the assembler explicitly. The server never persists it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::model::ResumeContent;
use crate::document::sections::known_section_ids;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionOrder(Vec<String>);

impl SectionOrder {
    pub fn new(ids: Vec<String>) -> Self {
        Self(ids)
    }

    /// personal-info, summary, experience, education, skills, projects,
    /// certifications, then custom sections in array order.
    pub fn default_for(content: &ResumeContent) -> Self {
        Self(known_section_ids(content))
    }

    /// Parses a stored JSON array of ids. Missing, malformed or empty data
    /// silently yields the default order.
    pub fn parse_stored(raw: Option<&str>, content: &ResumeContent) -> Self {
        let parsed = raw.and_then(|raw| match serde_json::from_str::<Vec<String>>(raw) {
            Ok(ids) => Some(ids),
            Err(e) => {
                debug!("Ignoring malformed stored section order: {e}");
                None
            }
        });
        match parsed {
            Some(ids) if !ids.is_empty() => Self(ids),
            _ => Self::default_for(content),
        }
    }

    /// Parses a comma-separated id list, as sent in a `?order=` query.
    pub fn from_query(raw: Option<&str>, content: &ResumeContent) -> Self {
        let ids: Vec<String> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();
        if ids.is_empty() {
            Self::default_for(content)
        } else {
            Self(ids)
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|existing| existing == id)
    }

    /// Brings the order in line with the sections that currently exist:
    /// known ids keep their stored relative order, unknown and duplicate ids
    /// are dropped, and newly known ids are appended in registry order.
    pub fn reconcile(&self, content: &ResumeContent) -> Self {
        let known = known_section_ids(content);
        let known_set: HashSet<&str> = known.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();

        let mut ids: Vec<String> = self
            .0
            .iter()
            .filter(|id| known_set.contains(id.as_str()) && seen.insert(id.as_str()))
            .cloned()
            .collect();
        let kept: HashSet<String> = ids.iter().cloned().collect();
        ids.extend(known.into_iter().filter(|id| !kept.contains(id)));
        Self(ids)
    }

    /// Drag-and-drop move: the `active` id is removed and re-inserted at the
    /// index `over` occupied. Returns `false` when either id is absent or
    /// both are the same.
    pub fn move_section(&mut self, active: &str, over: &str) -> bool {
        if active == over {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(active), self.position(over)) else {
            return false;
        };
        let id = self.0.remove(from);
        self.0.insert(to, id);
        true
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::CustomSection;

    fn content_with_custom(ids: &[&str]) -> ResumeContent {
        ResumeContent {
            custom_sections: ids
                .iter()
                .map(|id| CustomSection {
                    id: id.to_string(),
                    title: format!("Custom {id}"),
                    content: String::new(),
                    is_visible: true,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn order(ids: &[&str]) -> SectionOrder {
        SectionOrder::new(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_default_order() {
        let content = content_with_custom(&["c1", "c2"]);
        assert_eq!(
            SectionOrder::default_for(&content),
            order(&[
                "personal-info",
                "summary",
                "experience",
                "education",
                "skills",
                "projects",
                "certifications",
                "c1",
                "c2"
            ])
        );
    }

    #[test]
    fn test_malformed_stored_order_falls_back_to_default() {
        let content = content_with_custom(&["c1"]);
        let expected = SectionOrder::default_for(&content);
        assert_eq!(SectionOrder::parse_stored(Some("{not json"), &content), expected);
        assert_eq!(SectionOrder::parse_stored(Some("[1, 2]"), &content), expected);
        assert_eq!(SectionOrder::parse_stored(Some("[]"), &content), expected);
        assert_eq!(SectionOrder::parse_stored(None, &content), expected);
    }

    #[test]
    fn test_valid_stored_order_is_kept_verbatim() {
        let content = ResumeContent::default();
        let parsed = SectionOrder::parse_stored(Some(r#"["skills","summary"]"#), &content);
        assert_eq!(parsed, order(&["skills", "summary"]));
    }

    #[test]
    fn test_from_query() {
        let content = ResumeContent::default();
        assert_eq!(
            SectionOrder::from_query(Some("skills, summary,,"), &content),
            order(&["skills", "summary"])
        );
        assert_eq!(
            SectionOrder::from_query(None, &content),
            SectionOrder::default_for(&content)
        );
    }

    #[test]
    fn test_reconcile_drops_unknown_and_duplicates_and_appends_new() {
        let content = content_with_custom(&["c1", "c2"]);
        let stored = order(&["skills", "gone", "c2", "skills", "summary"]);
        let reconciled = stored.reconcile(&content);
        assert_eq!(
            reconciled,
            order(&[
                "skills",
                "c2",
                "summary",
                "personal-info",
                "experience",
                "education",
                "projects",
                "certifications",
                "c1"
            ])
        );
    }

    #[test]
    fn test_reconcile_is_a_permutation_of_known_ids() {
        let content = content_with_custom(&["a", "b", "c"]);
        let reconciled = order(&["c", "x", "a"]).reconcile(&content);
        let mut got = reconciled.ids().to_vec();
        let mut want = known_section_ids(&content);
        got.sort();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn test_move_section_forward_and_back() {
        let mut o = order(&["a", "b", "c", "d"]);
        assert!(o.move_section("a", "c"));
        assert_eq!(o, order(&["b", "c", "a", "d"]));
        assert!(o.move_section("d", "b"));
        assert_eq!(o, order(&["d", "b", "c", "a"]));
    }

    #[test]
    fn test_move_section_rejects_missing_ids() {
        let mut o = order(&["a", "b"]);
        assert!(!o.move_section("a", "z"));
        assert!(!o.move_section("a", "a"));
        assert_eq!(o, order(&["a", "b"]));
    }

    #[test]
    fn test_json_round_trip() {
        let content = ResumeContent::default();
        let o = order(&["skills", "summary"]);
        assert_eq!(SectionOrder::parse_stored(Some(&o.to_json()), &content), o);
    }
}
