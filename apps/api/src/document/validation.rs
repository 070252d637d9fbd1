//! Request validation for resume writes.
//!
//! A payload is rejected as a whole when any field fails; every failure is
//! reported in one message. Fields that pass are sanitized on the way out.

use std::collections::HashSet;

use email_address::EmailAddress;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::document::config::ResumeConfig;
use crate::document::defaults::{default_resume_content, DEFAULT_RESUME_NAME};
use crate::document::model::{
    Certification, CustomSection, Education, Position, Project, ResumeContent, ResumeDocument,
    Skill, StylingBundle, DEFAULT_TEMPLATE, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM,
};
use crate::document::sanitize::{plain_text, rich_text};
use crate::errors::AppError;

lazy_static! {
    static ref MONTH_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}$").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"^[+\d\s\-()]+$").unwrap();
    static ref UUID_REGEX: Regex =
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .unwrap();
}

const MAX_TEXT: usize = 5000;
const MAX_SHORT: usize = 255;
const MAX_URL: usize = 2048;

/// Incoming resume fields. Every field is optional; unknown fields are
/// rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResumePayload {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub linkedin_id: Option<String>,
    pub github_id: Option<String>,
    pub positions: Option<Vec<Position>>,
    pub educations: Option<Vec<Education>>,
    pub skills: Option<Vec<Skill>>,
    pub projects: Option<Vec<Project>>,
    pub certifications: Option<Vec<Certification>>,
    pub custom_sections: Option<Vec<CustomSection>>,
    pub config: Option<ResumeConfig>,
    pub template: Option<String>,
    pub zoom: Option<u16>,
    pub styling: Option<StylingBundle>,
    /// Revision stamp for ordered writes; see `resumes::store::update_resume`.
    pub revision: Option<i64>,
}

impl ResumePayload {
    /// Parses a raw JSON body, turning shape errors (unknown keys, wrong
    /// types) into validation errors.
    pub fn from_json(body: serde_json::Value) -> Result<Self, AppError> {
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))
    }
}

#[derive(Default)]
struct Checker {
    errors: Vec<String>,
}

impl Checker {
    fn fail(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn plain(&mut self, field: &str, value: &str, min: usize, max: usize) -> String {
        let len = value.chars().count();
        if len < min {
            self.fail(format!("{field} is required"));
        }
        if len > max {
            self.fail(format!("{field} must be at most {max} characters"));
        }
        plain_text(value)
    }

    fn rich(&mut self, field: &str, value: &str) -> String {
        if value.chars().count() > MAX_TEXT {
            self.fail(format!("{field} must be less than {MAX_TEXT} characters"));
        }
        rich_text(value)
    }

    fn month(&mut self, field: &str, value: &str, allow_present: bool) {
        let ok = MONTH_REGEX.is_match(value) || (allow_present && value == "Present");
        if !ok {
            if allow_present {
                self.fail(format!("{field} must be in YYYY-MM format or \"Present\""));
            } else {
                self.fail(format!("{field} must be in YYYY-MM format"));
            }
        }
    }

    fn optional_month(&mut self, field: &str, value: &str, allow_present: bool) {
        if !value.is_empty() {
            self.month(field, value, allow_present);
        }
    }

    fn url(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        if value.len() > MAX_URL {
            self.fail(format!("{field} must be at most {MAX_URL} characters"));
            return;
        }
        match reqwest::Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => self.fail(format!("{field}: Invalid URL")),
        }
    }

    fn max_items<T>(&mut self, field: &str, items: &[T], max: usize) {
        if items.len() > max {
            self.fail(format!("Maximum {max} {field} allowed"));
        }
    }

    fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.errors.join("; ")))
        }
    }
}

/// The sanitized, validated form of a [`ResumePayload`]. Absent fields stay
/// absent so callers can decide between create-with-defaults and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidResume {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub linkedin_id: Option<String>,
    pub github_id: Option<String>,
    pub positions: Option<Vec<Position>>,
    pub educations: Option<Vec<Education>>,
    pub skills: Option<Vec<Skill>>,
    pub projects: Option<Vec<Project>>,
    pub certifications: Option<Vec<Certification>>,
    pub custom_sections: Option<Vec<CustomSection>>,
    pub config: Option<ResumeConfig>,
    pub template: Option<String>,
    pub zoom: Option<u16>,
    pub styling: Option<StylingBundle>,
    pub revision: Option<i64>,
}

pub fn validate_payload(payload: ResumePayload) -> Result<ValidResume, AppError> {
    let mut c = Checker::default();

    let name = payload.name.map(|v| c.plain("name", &v, 0, MAX_SHORT));
    let first_name = payload.first_name.map(|v| c.plain("firstName", &v, 0, 100));
    let last_name = payload.last_name.map(|v| c.plain("lastName", &v, 0, 100));
    let email = payload.email.map(|v| {
        let normalized = v.trim().to_lowercase();
        if normalized.len() > MAX_SHORT {
            c.fail("email must be at most 255 characters");
        }
        if !normalized.is_empty() && !EmailAddress::is_valid(&normalized) {
            c.fail("Invalid email address");
        }
        normalized
    });
    let headline = payload.headline.map(|v| c.plain("headline", &v, 0, MAX_SHORT));
    let summary = payload.summary.map(|v| c.rich("Summary", &v));
    let location = payload.location.map(|v| c.plain("location", &v, 0, MAX_SHORT));
    let phone_number = payload.phone_number.map(|v| {
        if v.chars().count() > 20 {
            c.fail("phoneNumber must be at most 20 characters");
        }
        if !v.is_empty() && !PHONE_REGEX.is_match(&v) {
            c.fail("Invalid phone number");
        }
        v
    });
    let linkedin_id = payload.linkedin_id.map(|v| c.plain("linkedinId", &v, 0, MAX_SHORT));
    let github_id = payload.github_id.map(|v| c.plain("githubId", &v, 0, MAX_SHORT));

    let positions = payload.positions.map(|items| {
        c.max_items("positions", &items, 20);
        items
            .into_iter()
            .map(|p| {
                c.month("startDate", &p.start_date, false);
                c.month("endDate", &p.end_date, true);
                Position {
                    title: c.plain("title", &p.title, 1, MAX_SHORT),
                    company: c.plain("company", &p.company, 1, MAX_SHORT),
                    description: c.rich("Description", &p.description),
                    ..p
                }
            })
            .collect::<Vec<_>>()
    });

    let educations = payload.educations.map(|items| {
        c.max_items("educations", &items, 10);
        items
            .into_iter()
            .map(|e| {
                c.optional_month("startDate", &e.start_date, false);
                c.optional_month("endDate", &e.end_date, true);
                Education {
                    school_name: c.plain("schoolName", &e.school_name, 1, MAX_SHORT),
                    degree: c.plain("degree", &e.degree, 0, MAX_SHORT),
                    field_of_study: c.plain("fieldOfStudy", &e.field_of_study, 0, MAX_SHORT),
                    ..e
                }
            })
            .collect::<Vec<_>>()
    });

    let skills = payload.skills.map(|items| {
        c.max_items("skills", &items, 100);
        items
            .into_iter()
            .map(|s| Skill {
                name: c.plain("skill name", &s.name, 1, 100),
                ..s
            })
            .collect::<Vec<_>>()
    });

    let projects = payload.projects.map(|items| {
        c.max_items("projects", &items, 20);
        items
            .into_iter()
            .map(|p| {
                c.url("link", &p.link);
                Project {
                    title: c.plain("title", &p.title, 1, MAX_SHORT),
                    description: c.rich("Project description", &p.description),
                    ..p
                }
            })
            .collect::<Vec<_>>()
    });

    let certifications = payload.certifications.map(|items| {
        c.max_items("certifications", &items, 20);
        items
            .into_iter()
            .map(|cert| {
                c.month("completionDate", &cert.completion_date, false);
                if let Some(url) = &cert.credential_url {
                    c.url("credentialUrl", url);
                }
                Certification {
                    title: c.plain("title", &cert.title, 1, MAX_SHORT),
                    organization: c.plain("organization", &cert.organization, 1, MAX_SHORT),
                    description: cert
                        .description
                        .as_deref()
                        .map(|d| c.plain("Certification description", d, 0, MAX_TEXT)),
                    ..cert
                }
            })
            .collect::<Vec<_>>()
    });

    let custom_sections = payload.custom_sections.map(|items| {
        c.max_items("custom sections", &items, 10);
        let mut seen = HashSet::new();
        items
            .into_iter()
            .map(|s| {
                if !UUID_REGEX.is_match(&s.id) {
                    c.fail("Invalid section ID");
                } else if !seen.insert(s.id.to_lowercase()) {
                    c.fail(format!("Duplicate section ID {}", s.id));
                }
                CustomSection {
                    title: c.plain("title", &s.title, 1, MAX_SHORT),
                    content: c.rich("Section content", &s.content),
                    ..s
                }
            })
            .collect::<Vec<_>>()
    });

    let template = payload.template.map(|v| c.plain("template", &v, 0, 50));
    if let Some(zoom) = payload.zoom {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            c.fail(format!("zoom must be between {MIN_ZOOM} and {MAX_ZOOM}"));
        }
    }
    let styling = payload.styling.map(|s| StylingBundle {
        name_font: c.plain("nameFont", &s.name_font, 0, 100),
        heading_font: c.plain("headingFont", &s.heading_font, 0, 100),
        name_color: c.plain("nameColor", &s.name_color, 0, 32),
        heading_color: c.plain("headingColor", &s.heading_color, 0, 32),
        border_color: c.plain("borderColor", &s.border_color, 0, 32),
        company_color: c.plain("companyColor", &s.company_color, 0, 32),
        resume_background_color: c.plain(
            "resumeBackgroundColor",
            &s.resume_background_color,
            0,
            32,
        ),
        ..s
    });

    let valid = ValidResume {
        name,
        first_name,
        last_name,
        email,
        headline,
        summary,
        location,
        phone_number,
        linkedin_id,
        github_id,
        positions,
        educations,
        skills,
        projects,
        certifications,
        custom_sections,
        config: payload.config,
        template,
        zoom: payload.zoom,
        styling,
        revision: payload.revision,
    };
    c.finish(valid)
}

/// Runs a complete document through the same checks as an incoming write.
/// Used on documents assembled server-side, such as a new resume merged with
/// placeholder content.
pub fn check_document(doc: &ResumeDocument) -> Result<(), AppError> {
    let value = serde_json::to_value(doc).map_err(anyhow::Error::from)?;
    validate_payload(ResumePayload::from_json(value)?).map(|_| ())
}

fn non_empty_or<T>(provided: Option<Vec<T>>, fallback: Vec<T>) -> Vec<T> {
    match provided {
        Some(items) if !items.is_empty() => items,
        _ => fallback,
    }
}

impl ValidResume {
    /// Builds the document for a new resume: provided values win, missing
    /// values come from the placeholder content. Empty positions, educations,
    /// skills and certifications also fall back to placeholders.
    pub fn into_new_document(self) -> (String, ResumeDocument) {
        let defaults = default_resume_content();
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_RESUME_NAME.to_string());

        let content = ResumeContent {
            first_name: self.first_name.unwrap_or(defaults.first_name),
            last_name: self.last_name.unwrap_or(defaults.last_name),
            email: self.email.unwrap_or(defaults.email),
            headline: self.headline.unwrap_or(defaults.headline),
            summary: self.summary.unwrap_or(defaults.summary),
            location: self.location.unwrap_or(defaults.location),
            phone_number: self.phone_number.unwrap_or(defaults.phone_number),
            linkedin_id: self.linkedin_id.unwrap_or(defaults.linkedin_id),
            github_id: self.github_id.unwrap_or(defaults.github_id),
            positions: non_empty_or(self.positions, defaults.positions),
            educations: non_empty_or(self.educations, defaults.educations),
            skills: non_empty_or(self.skills, defaults.skills),
            projects: self.projects.unwrap_or(defaults.projects),
            certifications: non_empty_or(self.certifications, defaults.certifications),
            custom_sections: self.custom_sections.unwrap_or(defaults.custom_sections),
        };

        let document = ResumeDocument {
            content,
            config: self.config.unwrap_or_default(),
            template: self.template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            zoom: self.zoom.unwrap_or(DEFAULT_ZOOM),
            styling: self.styling.unwrap_or_default(),
        };
        (name, document)
    }

    /// Overlays provided fields on an existing document. Absent fields keep
    /// their stored value.
    pub fn apply_to(self, doc: &mut ResumeDocument) -> Option<String> {
        let c = &mut doc.content;
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field { c.$field = v; })*
            };
        }
        overlay!(
            first_name,
            last_name,
            email,
            headline,
            summary,
            location,
            phone_number,
            linkedin_id,
            github_id,
            positions,
            educations,
            skills,
            projects,
            certifications,
            custom_sections
        );
        if let Some(config) = self.config {
            doc.config = config;
        }
        if let Some(template) = self.template {
            doc.template = template;
        }
        if let Some(zoom) = self.zoom {
            doc.zoom = zoom;
        }
        if let Some(styling) = self.styling {
            doc.styling = styling;
        }
        self.name.filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(body: serde_json::Value) -> Result<ValidResume, AppError> {
        validate_payload(ResumePayload::from_json(body)?)
    }

    fn validation_message(result: Result<ValidResume, AppError>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_document_passes_update_validation() {
        let (_, document) = ValidResume::default().into_new_document();
        check_document(&document).unwrap();

        let mut body = serde_json::to_value(&document).unwrap();
        body["name"] = json!("My Resume");
        body["revision"] = json!(1);
        assert!(validate(body).is_ok());
    }

    #[test]
    fn test_check_document_rejects_bad_dates() {
        let (_, mut document) = ValidResume::default().into_new_document();
        document.content.positions[0].start_date = "Start Date".into();
        let msg = match check_document(&document) {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(msg.contains("startDate"));
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let msg = validation_message(validate(json!({ "nickname": "x" })));
        assert!(msg.contains("nickname"));
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let mut config = serde_json::to_value(ResumeConfig::default()).unwrap();
        config["showHobbies"] = json!(true);
        let msg = validation_message(validate(json!({ "config": config })));
        assert!(msg.contains("showHobbies"));
    }

    #[test]
    fn test_position_dates() {
        let ok = validate(json!({ "positions": [{
            "title": "Dev", "company": "Acme", "startDate": "2020-01", "endDate": "Present"
        }]}));
        assert!(ok.is_ok());

        let msg = validation_message(validate(json!({ "positions": [{
            "title": "Dev", "company": "Acme", "startDate": "Jan 2020", "endDate": "2021-13x"
        }]})));
        assert!(msg.contains("startDate must be in YYYY-MM format"));
        assert!(msg.contains("endDate must be in YYYY-MM format or \"Present\""));
    }

    #[test]
    fn test_present_not_allowed_as_start_or_completion_date() {
        let msg = validation_message(validate(json!({ "positions": [{
            "title": "Dev", "company": "Acme", "startDate": "Present", "endDate": "Present"
        }]})));
        assert!(msg.contains("startDate"));

        let msg = validation_message(validate(json!({ "certifications": [{
            "title": "AWS", "organization": "Amazon", "completionDate": "Present"
        }]})));
        assert!(msg.contains("completionDate"));
    }

    #[test]
    fn test_education_dates_are_optional() {
        let ok = validate(json!({ "educations": [{ "schoolName": "MIT", "startDate": "", "endDate": "" }]}));
        assert!(ok.is_ok());
        assert!(validate(json!({ "educations": [{ "schoolName": "MIT", "endDate": "soon" }]})).is_err());
    }

    #[test]
    fn test_plain_fields_are_sanitized_and_rich_fields_allow_listed() {
        let valid = validate(json!({
            "headline": "<b>Staff</b> Engineer",
            "summary": "<p onclick=\"x()\">Hello <strong>world</strong></p><script>x()</script>",
        }))
        .unwrap();
        assert_eq!(valid.headline.as_deref(), Some("Staff Engineer"));
        assert_eq!(valid.summary.as_deref(), Some("<p>Hello <strong>world</strong></p>"));
    }

    #[test]
    fn test_email_is_normalized_and_checked() {
        let valid = validate(json!({ "email": "  Ada@Example.COM " })).unwrap();
        assert_eq!(valid.email.as_deref(), Some("ada@example.com"));
        assert!(validate(json!({ "email": "not-an-email" })).is_err());
    }

    #[test]
    fn test_phone_and_urls() {
        assert!(validate(json!({ "phoneNumber": "+1 (555) 123-4567" })).is_ok());
        assert!(validate(json!({ "phoneNumber": "call me" })).is_err());
        assert!(validate(json!({ "projects": [{ "title": "x", "link": "ftp://x" }]})).is_err());
        assert!(validate(json!({ "projects": [{ "title": "x", "link": "" }]})).is_ok());
    }

    #[test]
    fn test_zoom_bounds() {
        assert!(validate(json!({ "zoom": 50 })).is_ok());
        assert!(validate(json!({ "zoom": 200 })).is_ok());
        assert!(validate(json!({ "zoom": 49 })).is_err());
        assert!(validate(json!({ "zoom": 201 })).is_err());
    }

    #[test]
    fn test_list_limits() {
        let skills: Vec<_> = (0..101).map(|i| json!({ "name": format!("s{i}") })).collect();
        let msg = validation_message(validate(json!({ "skills": skills })));
        assert!(msg.contains("Maximum 100 skills"));
    }

    #[test]
    fn test_custom_section_ids_must_be_unique_uuids() {
        let id = "6f1c3c4e-8a55-4c55-9c2e-1f2a3b4c5d6e";
        let section = json!({ "id": id, "title": "T", "content": "", "isVisible": true });
        assert!(validate(json!({ "customSections": [section.clone()] })).is_ok());
        assert!(validate(json!({ "customSections": [section.clone(), section] })).is_err());
        let bad = json!({ "id": "custom-1", "title": "T", "content": "", "isVisible": true });
        assert!(validate(json!({ "customSections": [bad] })).is_err());
    }

    #[test]
    fn test_new_document_merges_defaults() {
        let (name, doc) = validate(json!({ "name": "Test Resume", "firstName": "Ada", "skills": [] }))
            .unwrap()
            .into_new_document();
        let defaults = default_resume_content();
        assert_eq!(name, "Test Resume");
        assert_eq!(doc.content.first_name, "Ada");
        assert_eq!(doc.content.headline, defaults.headline);
        assert_eq!(doc.content.skills, defaults.skills);
        assert!(doc.content.projects.is_empty());
        assert_eq!(doc.zoom, DEFAULT_ZOOM);
        assert_eq!(doc.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_new_document_default_name() {
        let (name, _) = ValidResume::default().into_new_document();
        assert_eq!(name, DEFAULT_RESUME_NAME);
    }

    #[test]
    fn test_apply_to_only_overlays_present_fields() {
        let (_, mut doc) = ValidResume::default().into_new_document();
        let before = doc.clone();
        let renamed = validate(json!({ "headline": "New", "zoom": 150 }))
            .unwrap()
            .apply_to(&mut doc);
        assert_eq!(renamed, None);
        assert_eq!(doc.content.headline, "New");
        assert_eq!(doc.zoom, 150);
        assert_eq!(doc.content.positions, before.content.positions);
        assert_eq!(doc.config, before.config);
    }
}
