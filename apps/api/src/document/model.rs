use serde::{Deserialize, Serialize};

use crate::document::config::ResumeConfig;

/// Editable content of a resume, in the editor's camelCase wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeContent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub headline: String,
    /// Rich text (allow-listed HTML).
    pub summary: String,
    pub location: String,
    pub phone_number: String,
    pub linkedin_id: String,
    pub github_id: String,
    pub positions: Vec<Position>,
    pub educations: Vec<Education>,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub custom_sections: Vec<CustomSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub title: String,
    pub company: String,
    pub start_date: String,
    /// `YYYY-MM` or the literal `Present`.
    pub end_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub school_name: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field_of_study: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub title: String,
    pub organization: String,
    pub completion_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSection {
    pub id: String,
    pub title: String,
    /// Rich text (allow-listed HTML).
    pub content: String,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillsStyle {
    #[default]
    Chips,
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadingStyle {
    Background,
    #[default]
    BorderBottom,
    BorderTop,
}

/// Typography and colour choices applied by the preview renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylingBundle {
    pub name_font: String,
    pub heading_font: String,
    pub name_color: String,
    pub heading_color: String,
    pub border_color: String,
    pub company_color: String,
    pub resume_background_color: String,
    pub skills_style: SkillsStyle,
    pub heading_style: HeadingStyle,
}

impl Default for StylingBundle {
    fn default() -> Self {
        let emerald = ColorScheme::Emerald.palette();
        Self {
            name_font: "Inter".to_string(),
            heading_font: "Inter".to_string(),
            name_color: emerald.name_color.to_string(),
            heading_color: emerald.heading_color.to_string(),
            border_color: emerald.border_color.to_string(),
            company_color: emerald.company_color.to_string(),
            resume_background_color: "#ffffff".to_string(),
            skills_style: SkillsStyle::Chips,
            heading_style: HeadingStyle::BorderBottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name_color: &'static str,
    pub heading_color: &'static str,
    pub border_color: &'static str,
    pub company_color: &'static str,
}

/// Named colour presets offered by the editor's theme picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Emerald,
    Blue,
    Slate,
}

impl ColorScheme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "emerald" => Some(Self::Emerald),
            "blue" => Some(Self::Blue),
            "slate" => Some(Self::Slate),
            _ => None,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            ColorScheme::Emerald => Palette {
                name_color: "#1b4332",
                heading_color: "#2d6a4f",
                border_color: "#40916c",
                company_color: "#059669",
            },
            ColorScheme::Blue => Palette {
                name_color: "#1a365d",
                heading_color: "#2b4c7e",
                border_color: "#4a90e2",
                company_color: "#3b82f6",
            },
            ColorScheme::Slate => Palette {
                name_color: "#1f2937",
                heading_color: "#4b5563",
                border_color: "#9ca3af",
                company_color: "#6b7280",
            },
        }
    }
}

impl StylingBundle {
    /// Applies a named colour preset. Unknown names are logged and leave the
    /// styling untouched.
    pub fn apply_color_scheme(&mut self, name: &str) -> bool {
        let Some(scheme) = ColorScheme::from_name(name) else {
            tracing::warn!("Unknown color scheme: {name}");
            return false;
        };
        let palette = scheme.palette();
        self.name_color = palette.name_color.to_string();
        self.heading_color = palette.heading_color.to_string();
        self.border_color = palette.border_color.to_string();
        self.company_color = palette.company_color.to_string();
        true
    }
}

pub const DEFAULT_TEMPLATE: &str = "default";
pub const DEFAULT_ZOOM: u16 = 100;
pub const MIN_ZOOM: u16 = 50;
pub const MAX_ZOOM: u16 = 200;

/// The full document: content plus every presentation field. This is the
/// single authoritative representation that is persisted and rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    #[serde(flatten)]
    pub content: ResumeContent,
    #[serde(default)]
    pub config: ResumeConfig,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_zoom")]
    pub zoom: u16,
    #[serde(default)]
    pub styling: StylingBundle,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_zoom() -> u16 {
    DEFAULT_ZOOM
}

impl Default for ResumeDocument {
    fn default() -> Self {
        Self {
            content: ResumeContent::default(),
            config: ResumeConfig::default(),
            template: default_template(),
            zoom: DEFAULT_ZOOM,
            styling: StylingBundle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> ResumeDocument {
        ResumeDocument {
            content: ResumeContent {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                headline: "Analyst".into(),
                summary: "<p>First programmer.</p>".into(),
                positions: vec![Position {
                    title: "Engineer".into(),
                    company: "Analytical Engines".into(),
                    start_date: "1842-01".into(),
                    end_date: "Present".into(),
                    description: "<ul><li>Notes</li></ul>".into(),
                    display_order: Some(0),
                }],
                certifications: vec![Certification {
                    title: "Mathematics".into(),
                    organization: "Royal Society".into(),
                    completion_date: "1840-06".into(),
                    description: None,
                    credential_url: Some("https://example.com/c/1".into()),
                    display_order: None,
                }],
                custom_sections: vec![CustomSection {
                    id: "6f1c3c4e-8a55-4c55-9c2e-1f2a3b4c5d6e".into(),
                    title: "Languages".into(),
                    content: "<p>French</p>".into(),
                    is_visible: false,
                }],
                ..Default::default()
            },
            template: "modern".into(),
            zoom: 125,
            ..Default::default()
        }
    }

    #[test]
    fn test_document_survives_json_round_trip() {
        let doc = sample_document();
        let value = serde_json::to_value(&doc).unwrap();
        let back: ResumeDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let value = serde_json::to_value(sample_document()).unwrap();
        assert!(value.get("firstName").is_some());
        assert!(value.get("customSections").is_some());
        assert_eq!(value["positions"][0]["endDate"], "Present");
        assert_eq!(value["styling"]["skillsStyle"], "chips");
        assert_eq!(value["styling"]["headingStyle"], "border-bottom");
    }

    #[test]
    fn test_missing_presentation_fields_take_defaults() {
        let doc: ResumeDocument = serde_json::from_str(r#"{"firstName":"Ada"}"#).unwrap();
        assert_eq!(doc.template, DEFAULT_TEMPLATE);
        assert_eq!(doc.zoom, DEFAULT_ZOOM);
        assert_eq!(doc.config, ResumeConfig::default());
    }

    #[test]
    fn test_apply_color_scheme() {
        let mut styling = StylingBundle::default();
        assert!(styling.apply_color_scheme("slate"));
        assert_eq!(styling.name_color, "#1f2937");
        assert_eq!(styling.company_color, "#6b7280");
    }

    #[test]
    fn test_unknown_color_scheme_leaves_styling_untouched() {
        let mut styling = StylingBundle::default();
        let before = styling.clone();
        assert!(!styling.apply_color_scheme("magenta"));
        assert_eq!(styling, before);
    }
}
