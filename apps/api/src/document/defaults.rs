use crate::document::model::{Certification, Education, Position, ResumeContent, Skill};

pub const DEFAULT_RESUME_NAME: &str = "My Resume";

/// Placeholder content for a freshly created resume, so the editor never
/// starts from a blank page.
pub fn default_resume_content() -> ResumeContent {
    ResumeContent {
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        headline: "Your Professional Headline".to_string(),
        summary: "<p>Write a brief summary of your professional background, key skills, and \
                  career objectives. This section helps employers quickly understand who you \
                  are and what you bring to the table.</p>"
            .to_string(),
        location: String::new(),
        phone_number: String::new(),
        linkedin_id: String::new(),
        github_id: String::new(),
        positions: vec![Position {
            title: "Your Job Title".to_string(),
            company: "Company Name".to_string(),
            start_date: "2024-01".to_string(),
            end_date: "Present".to_string(),
            description: "<p>Describe your key responsibilities and achievements in this role. \
                          Use bullet points to highlight your accomplishments.</p>"
                .to_string(),
            display_order: None,
        }],
        educations: vec![Education {
            school_name: "University or School Name".to_string(),
            degree: "Degree Type".to_string(),
            field_of_study: "Field of Study".to_string(),
            start_date: "2020-09".to_string(),
            end_date: "2024-06".to_string(),
            display_order: None,
        }],
        skills: (1..=4)
            .map(|i| Skill {
                name: format!("Skill {i}"),
                display_order: None,
            })
            .collect(),
        projects: Vec::new(),
        certifications: vec![Certification {
            title: "Certification Name".to_string(),
            organization: "Issuing Organization".to_string(),
            completion_date: "2024-01".to_string(),
            description: Some("Brief description of the certification".to_string()),
            credential_url: None,
            display_order: None,
        }],
        custom_sections: Vec::new(),
    }
}
