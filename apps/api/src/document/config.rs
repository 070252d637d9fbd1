//! Visibility configuration and the guard that keeps unknown keys out of it.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Every recognized visibility flag, in wire (camelCase) form.
pub const CONFIG_KEYS: [&str; 12] = [
    "showPhoto",
    "showSummary",
    "showExperience",
    "showEducation",
    "showSkills",
    "showProjects",
    "showRepositories",
    "showAwards",
    "showCertificates",
    "showLanguages",
    "showVolunteer",
    "showCertifications",
];

/// One boolean per section flag. The set is closed: deserializing a payload
/// with any other key fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResumeConfig {
    pub show_photo: bool,
    pub show_summary: bool,
    pub show_experience: bool,
    pub show_education: bool,
    pub show_skills: bool,
    pub show_projects: bool,
    pub show_repositories: bool,
    pub show_awards: bool,
    pub show_certificates: bool,
    pub show_languages: bool,
    pub show_volunteer: bool,
    pub show_certifications: bool,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            show_photo: true,
            show_summary: true,
            show_experience: true,
            show_education: true,
            show_skills: true,
            show_projects: true,
            show_repositories: false,
            show_awards: false,
            show_certificates: false,
            show_languages: false,
            show_volunteer: false,
            show_certifications: true,
        }
    }
}

pub fn is_valid_config_key(key: &str) -> bool {
    CONFIG_KEYS.contains(&key)
}

impl ResumeConfig {
    fn flag_mut(&mut self, key: &str) -> Option<&mut bool> {
        let flag = match key {
            "showPhoto" => &mut self.show_photo,
            "showSummary" => &mut self.show_summary,
            "showExperience" => &mut self.show_experience,
            "showEducation" => &mut self.show_education,
            "showSkills" => &mut self.show_skills,
            "showProjects" => &mut self.show_projects,
            "showRepositories" => &mut self.show_repositories,
            "showAwards" => &mut self.show_awards,
            "showCertificates" => &mut self.show_certificates,
            "showLanguages" => &mut self.show_languages,
            "showVolunteer" => &mut self.show_volunteer,
            "showCertifications" => &mut self.show_certifications,
            _ => return None,
        };
        Some(flag)
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        let mut copy = *self;
        copy.flag_mut(key).map(|flag| *flag)
    }

    /// Sets one flag by its wire name.
    ///
    /// Unknown keys are logged and dropped: the config is left exactly as it
    /// was and `false` is returned. No error reaches the caller, since a UI
    /// toggle is best-effort.
    pub fn apply(&mut self, key: &str, value: bool) -> bool {
        match self.flag_mut(key) {
            Some(flag) => {
                *flag = value;
                true
            }
            None => {
                warn!("Invalid config key: {key}");
                false
            }
        }
    }

    /// Applies a batch of toggles, skipping unknown keys individually.
    /// Returns how many were applied.
    pub fn apply_all<'a, I>(&mut self, updates: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        updates
            .into_iter()
            .filter(|(key, value)| self.apply(key, *value))
            .count()
    }
}
