//! Document assembly: field values + visibility config + order list → the
//! ordered sections that get rendered.
//!
//! Algorithm:
//! 1. Build an id → entry lookup holding only sections whose predicate holds
//!    (flag on and, for data-bearing built-ins, non-empty data; custom
//!    sections use their own `is_visible`).
//! 2. Walk the order list and move matching entries into the output.
//! 3. Append whatever is left. The lookup keeps insertion order (built-ins in
//!    registry order, then custom sections in array order) so stragglers are
//!    placed deterministically.

use serde::Serialize;

use crate::document::config::ResumeConfig;
use crate::document::model::{
    Certification, Education, Position, Project, ResumeContent, ResumeDocument, Skill,
};
use crate::document::order::SectionOrder;
use crate::document::sections::BuiltinSection;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub headline: String,
    pub location: String,
    pub phone_number: String,
    pub linkedin_id: String,
    pub github_id: String,
}

impl HeaderInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum SectionBody {
    Header(HeaderInfo),
    Summary(String),
    Positions(Vec<Position>),
    Education(Vec<Education>),
    Skills(Vec<Skill>),
    Projects(Vec<Project>),
    Certifications(Vec<Certification>),
    Custom(String),
}

impl SectionBody {
    pub fn kind(&self) -> &'static str {
        match self {
            SectionBody::Header(_) => "header",
            SectionBody::Summary(_) => "summary",
            SectionBody::Positions(_) => "positions",
            SectionBody::Education(_) => "education",
            SectionBody::Skills(_) => "skills",
            SectionBody::Projects(_) => "projects",
            SectionBody::Certifications(_) => "certifications",
            SectionBody::Custom(_) => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledSection {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub body: SectionBody,
}

fn builtin_entry(section: BuiltinSection, content: &ResumeContent) -> AssembledSection {
    let body = match section {
        BuiltinSection::PersonalInfo => SectionBody::Header(HeaderInfo {
            first_name: content.first_name.clone(),
            last_name: content.last_name.clone(),
            email: content.email.clone(),
            headline: content.headline.clone(),
            location: content.location.clone(),
            phone_number: content.phone_number.clone(),
            linkedin_id: content.linkedin_id.clone(),
            github_id: content.github_id.clone(),
        }),
        BuiltinSection::Summary => SectionBody::Summary(content.summary.clone()),
        BuiltinSection::Experience => SectionBody::Positions(sorted(&content.positions, |p| p.display_order)),
        BuiltinSection::Education => SectionBody::Education(sorted(&content.educations, |e| e.display_order)),
        BuiltinSection::Skills => SectionBody::Skills(sorted(&content.skills, |s| s.display_order)),
        BuiltinSection::Projects => SectionBody::Projects(sorted(&content.projects, |p| p.display_order)),
        BuiltinSection::Certifications => {
            SectionBody::Certifications(sorted(&content.certifications, |c| c.display_order))
        }
    };
    AssembledSection {
        id: section.id().to_string(),
        title: section.title().to_string(),
        body,
    }
}

/// Stable sort by display-order hint. Entries without a hint sort by their
/// array index.
fn sorted<T: Clone>(items: &[T], hint: impl Fn(&T) -> Option<i32>) -> Vec<T> {
    let mut indexed: Vec<(i64, &T)> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (hint(item).map(i64::from).unwrap_or(i as i64), item))
        .collect();
    indexed.sort_by_key(|(key, _)| *key);
    indexed.into_iter().map(|(_, item)| item.clone()).collect()
}

/// Every section that should currently render, in lookup (registry) order.
pub fn visible_sections(content: &ResumeContent, config: &ResumeConfig) -> Vec<AssembledSection> {
    let builtins = BuiltinSection::ALL
        .into_iter()
        .filter(|section| section.should_render(content, config))
        .map(|section| builtin_entry(section, content));

    let customs = content
        .custom_sections
        .iter()
        .filter(|custom| custom.is_visible)
        .map(|custom| AssembledSection {
            id: custom.id.clone(),
            title: custom.title.clone(),
            body: SectionBody::Custom(custom.content.clone()),
        });

    builtins.chain(customs).collect()
}

pub fn assemble(
    content: &ResumeContent,
    config: &ResumeConfig,
    order: &SectionOrder,
) -> Vec<AssembledSection> {
    let mut lookup = visible_sections(content, config);
    let mut ordered = Vec::with_capacity(lookup.len());

    for id in order.ids() {
        if let Some(idx) = lookup.iter().position(|entry| &entry.id == id) {
            ordered.push(lookup.remove(idx));
        }
    }
    ordered.extend(lookup);
    ordered
}

pub fn assemble_document(doc: &ResumeDocument, order: &SectionOrder) -> Vec<AssembledSection> {
    assemble(&doc.content, &doc.config, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::config::CONFIG_KEYS;
    use crate::document::defaults::default_resume_content;
    use crate::document::model::CustomSection;

    fn ids(sections: &[AssembledSection]) -> Vec<&str> {
        sections.iter().map(|s| s.id.as_str()).collect()
    }

    fn populated() -> ResumeContent {
        let mut content = default_resume_content();
        content.projects = vec![Project {
            title: "Compiler".into(),
            link: String::new(),
            description: "<p>A toy compiler</p>".into(),
            display_order: None,
        }];
        content.custom_sections = vec![
            CustomSection {
                id: "c-visible".into(),
                title: "Talks".into(),
                content: "<p>RustConf</p>".into(),
                is_visible: true,
            },
            CustomSection {
                id: "c-hidden".into(),
                title: "Hobbies".into(),
                content: "<p>Chess</p>".into(),
                is_visible: false,
            },
        ];
        content
    }

    #[test]
    fn test_default_content_assembles_in_default_order() {
        let content = default_resume_content();
        let config = ResumeConfig::default();
        let order = SectionOrder::default_for(&content);
        let sections = assemble(&content, &config, &order);
        assert_eq!(
            ids(&sections),
            vec!["personal-info", "summary", "experience", "education", "skills", "certifications"]
        );
        assert_eq!(sections[2].title, "Experience");
        assert!(matches!(&sections[2].body, SectionBody::Positions(p) if p[0].title == "Your Job Title"));
    }

    #[test]
    fn test_personal_info_follows_show_photo() {
        let content = default_resume_content();
        let mut config = ResumeConfig::default();
        config.show_photo = false;
        let sections = assemble(&content, &config, &SectionOrder::default_for(&content));
        assert_eq!(ids(&sections)[0], "summary");
    }

    #[test]
    fn test_empty_experience_never_renders() {
        let mut content = populated();
        content.positions.clear();
        let config = ResumeConfig::default();
        assert!(config.show_experience);
        let sections = assemble(&content, &config, &SectionOrder::default_for(&content));
        assert!(!ids(&sections).contains(&"experience"));
    }

    #[test]
    fn test_blank_summary_never_renders() {
        let mut content = populated();
        content.summary = "   ".into();
        let sections = assemble(&content, &ResumeConfig::default(), &SectionOrder::default());
        assert!(!ids(&sections).contains(&"summary"));
    }

    #[test]
    fn test_presence_matches_predicate_for_every_config() {
        let content = populated();
        // Walk every combination of the seven built-in flags.
        for mask in 0u32..(1 << 7) {
            let mut config = ResumeConfig::default();
            for (bit, section) in BuiltinSection::ALL.iter().enumerate() {
                config.apply(section.config_key(), mask & (1 << bit) != 0);
            }
            let sections = assemble(&content, &config, &SectionOrder::default_for(&content));
            let got = ids(&sections);
            for section in BuiltinSection::ALL {
                let expected = section.is_enabled(&config) && section.has_content(&content);
                assert_eq!(got.contains(&section.id()), expected, "mask {mask:#b} {section:?}");
            }
            assert!(got.contains(&"c-visible"));
            assert!(!got.contains(&"c-hidden"));
        }
    }

    #[test]
    fn test_flags_without_sections_do_not_add_output() {
        let content = populated();
        let mut config = ResumeConfig::default();
        for key in CONFIG_KEYS {
            config.apply(key, true);
        }
        let sections = assemble(&content, &config, &SectionOrder::default_for(&content));
        assert_eq!(sections.len(), 8);
    }

    #[test]
    fn test_output_follows_permutations() {
        let content = populated();
        let config = ResumeConfig::default();
        let base = vec!["summary", "skills", "c-visible", "experience"];
        let permutations = [
            vec![0, 1, 2, 3],
            vec![3, 2, 1, 0],
            vec![2, 0, 3, 1],
            vec![1, 3, 0, 2],
        ];
        for perm in permutations {
            let chosen: Vec<String> = perm.iter().map(|&i| base[i].to_string()).collect();
            let sections = assemble(&content, &config, &SectionOrder::new(chosen.clone()));
            let got: Vec<&str> = ids(&sections)
                .into_iter()
                .filter(|id| chosen.iter().any(|c| c == id))
                .collect();
            assert_eq!(got, chosen.iter().map(String::as_str).collect::<Vec<_>>());
            // Arranged sections come first, in the chosen order.
            assert_eq!(&ids(&sections)[..chosen.len()], got.as_slice());
        }
    }

    #[test]
    fn test_stragglers_are_appended_deterministically() {
        let content = populated();
        let config = ResumeConfig::default();
        let order = SectionOrder::new(vec!["skills".into(), "summary".into()]);
        let sections = assemble(&content, &config, &order);
        assert_eq!(
            ids(&sections),
            vec![
                "skills",
                "summary",
                "personal-info",
                "experience",
                "education",
                "projects",
                "certifications",
                "c-visible"
            ]
        );
    }

    #[test]
    fn test_no_duplicates_when_order_repeats_ids() {
        let content = populated();
        let order = SectionOrder::new(vec!["skills".into(), "skills".into(), "unknown".into()]);
        let sections = assemble(&content, &ResumeConfig::default(), &order);
        let mut seen = ids(&sections);
        let total = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_display_order_hint_sorts_entries() {
        let mut content = populated();
        content.skills = vec![
            Skill { name: "C".into(), display_order: Some(2) },
            Skill { name: "A".into(), display_order: Some(0) },
            Skill { name: "B".into(), display_order: Some(1) },
        ];
        let sections = visible_sections(&content, &ResumeConfig::default());
        let skills = sections.iter().find(|s| s.id == "skills").unwrap();
        match &skills.body {
            SectionBody::Skills(list) => {
                let names: Vec<_> = list.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, vec!["A", "B", "C"]);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_serialized_shape() {
        let content = populated();
        let sections = assemble(&content, &ResumeConfig::default(), &SectionOrder::default());
        let value = serde_json::to_value(&sections).unwrap();
        assert_eq!(value[0]["id"], "personal-info");
        assert_eq!(value[0]["kind"], "header");
        assert_eq!(value[1]["kind"], "summary");
    }
}
