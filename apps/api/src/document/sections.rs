use serde::{Deserialize, Serialize};

use crate::document::config::ResumeConfig;
use crate::document::model::ResumeContent;

/// The built-in sections, in default document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinSection {
    PersonalInfo,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
}

impl BuiltinSection {
    pub const ALL: [BuiltinSection; 7] = [
        BuiltinSection::PersonalInfo,
        BuiltinSection::Summary,
        BuiltinSection::Experience,
        BuiltinSection::Education,
        BuiltinSection::Skills,
        BuiltinSection::Projects,
        BuiltinSection::Certifications,
    ];

    pub fn id(self) -> &'static str {
        match self {
            BuiltinSection::PersonalInfo => "personal-info",
            BuiltinSection::Summary => "summary",
            BuiltinSection::Experience => "experience",
            BuiltinSection::Education => "education",
            BuiltinSection::Skills => "skills",
            BuiltinSection::Projects => "projects",
            BuiltinSection::Certifications => "certifications",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Wire name of the flag that controls this section.
    pub fn config_key(self) -> &'static str {
        match self {
            BuiltinSection::PersonalInfo => "showPhoto",
            BuiltinSection::Summary => "showSummary",
            BuiltinSection::Experience => "showExperience",
            BuiltinSection::Education => "showEducation",
            BuiltinSection::Skills => "showSkills",
            BuiltinSection::Projects => "showProjects",
            BuiltinSection::Certifications => "showCertifications",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            BuiltinSection::PersonalInfo => "Personal Info",
            BuiltinSection::Summary => "Summary",
            BuiltinSection::Experience => "Experience",
            BuiltinSection::Education => "Education",
            BuiltinSection::Skills => "Skills",
            BuiltinSection::Projects => "Projects",
            BuiltinSection::Certifications => "Certifications",
        }
    }

    pub fn is_enabled(self, config: &ResumeConfig) -> bool {
        match self {
            BuiltinSection::PersonalInfo => config.show_photo,
            BuiltinSection::Summary => config.show_summary,
            BuiltinSection::Experience => config.show_experience,
            BuiltinSection::Education => config.show_education,
            BuiltinSection::Skills => config.show_skills,
            BuiltinSection::Projects => config.show_projects,
            BuiltinSection::Certifications => config.show_certifications,
        }
    }

    /// Whether the backing field or list has anything to show. The header
    /// carries no list and is always considered populated.
    pub fn has_content(self, content: &ResumeContent) -> bool {
        match self {
            BuiltinSection::PersonalInfo => true,
            BuiltinSection::Summary => !content.summary.trim().is_empty(),
            BuiltinSection::Experience => !content.positions.is_empty(),
            BuiltinSection::Education => !content.educations.is_empty(),
            BuiltinSection::Skills => !content.skills.is_empty(),
            BuiltinSection::Projects => !content.projects.is_empty(),
            BuiltinSection::Certifications => !content.certifications.is_empty(),
        }
    }

    pub fn should_render(self, content: &ResumeContent, config: &ResumeConfig) -> bool {
        self.is_enabled(config) && self.has_content(content)
    }
}

/// Ids of every section that currently exists: all built-ins, then custom
/// sections in array order.
pub fn known_section_ids(content: &ResumeContent) -> Vec<String> {
    BuiltinSection::ALL
        .iter()
        .map(|s| s.id().to_string())
        .chain(content.custom_sections.iter().map(|c| c.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::config::is_valid_config_key;
    use crate::document::model::{CustomSection, Skill};

    #[test]
    fn test_ids_round_trip() {
        for section in BuiltinSection::ALL {
            assert_eq!(BuiltinSection::from_id(section.id()), Some(section));
        }
        assert_eq!(BuiltinSection::from_id("hobbies"), None);
    }

    #[test]
    fn test_each_section_has_exactly_one_recognized_flag() {
        let mut keys: Vec<_> = BuiltinSection::ALL.iter().map(|s| s.config_key()).collect();
        assert!(keys.iter().all(|k| is_valid_config_key(k)));
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), BuiltinSection::ALL.len());
    }

    #[test]
    fn test_is_enabled_reads_the_mapped_flag() {
        for section in BuiltinSection::ALL {
            let mut config = ResumeConfig::default();
            config.apply(section.config_key(), false);
            assert!(!section.is_enabled(&config), "{section:?}");
            config.apply(section.config_key(), true);
            assert!(section.is_enabled(&config), "{section:?}");
        }
    }

    #[test]
    fn test_empty_lists_have_no_content() {
        let content = ResumeContent::default();
        assert!(BuiltinSection::PersonalInfo.has_content(&content));
        assert!(!BuiltinSection::Summary.has_content(&content));
        assert!(!BuiltinSection::Experience.has_content(&content));
        assert!(!BuiltinSection::Skills.has_content(&content));
    }

    #[test]
    fn test_known_ids_append_custom_sections() {
        let content = ResumeContent {
            skills: vec![Skill {
                name: "Rust".into(),
                display_order: None,
            }],
            custom_sections: vec![CustomSection {
                id: "c1".into(),
                title: "Talks".into(),
                content: String::new(),
                is_visible: true,
            }],
            ..Default::default()
        };
        let ids = known_section_ids(&content);
        assert_eq!(ids.len(), 8);
        assert_eq!(ids[0], "personal-info");
        assert_eq!(ids[7], "c1");
    }
}
