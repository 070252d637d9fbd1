use std::fmt::Write;

use crate::document::assembler::{AssembledSection, HeaderInfo, SectionBody};
use crate::document::model::{
    Certification, Education, HeadingStyle, Position, Project, Skill, SkillsStyle, StylingBundle,
};
use crate::document::sanitize::escape_html;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `2021-03` → `Mar 2021`. Anything else (including `Present`) is shown as-is.
pub fn format_month(raw: &str) -> String {
    let parsed = raw.split_once('-').and_then(|(year, month)| {
        let idx = month.parse::<usize>().ok()?.checked_sub(1)?;
        let name = MONTHS.get(idx)?;
        (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then(|| format!("{name} {year}"))
    });
    parsed.unwrap_or_else(|| escape_html(raw))
}

fn date_range(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format_month(start),
        (true, false) => format_month(end),
        (false, false) => format!("{} – {}", format_month(start), format_month(end)),
    }
}

pub fn heading(title: &str, styling: &StylingBundle) -> String {
    let style = match styling.heading_style {
        HeadingStyle::Background => format!(
            "background-color: {}; color: #ffffff; padding: 2px 8px;",
            escape_html(&styling.border_color)
        ),
        HeadingStyle::BorderBottom => format!(
            "color: {}; border-bottom: 2px solid {};",
            escape_html(&styling.heading_color),
            escape_html(&styling.border_color)
        ),
        HeadingStyle::BorderTop => format!(
            "color: {}; border-top: 2px solid {};",
            escape_html(&styling.heading_color),
            escape_html(&styling.border_color)
        ),
    };
    format!(
        "<h2 class=\"section-heading\" style=\"font-family: {}; {style}\">{}</h2>",
        escape_html(&styling.heading_font),
        escape_html(title)
    )
}

fn header(info: &HeaderInfo, styling: &StylingBundle) -> String {
    let mut html = format!(
        "<header class=\"resume-header\"><h1 style=\"font-family: {}; color: {};\">{}</h1>",
        escape_html(&styling.name_font),
        escape_html(&styling.name_color),
        escape_html(&info.full_name())
    );
    if !info.headline.is_empty() {
        let _ = write!(html, "<p class=\"headline\">{}</p>", escape_html(&info.headline));
    }

    let mut contact = Vec::new();
    if !info.email.is_empty() {
        let email = escape_html(&info.email);
        contact.push(format!("<a href=\"mailto:{email}\">{email}</a>"));
    }
    for plain in [&info.phone_number, &info.location] {
        if !plain.is_empty() {
            contact.push(escape_html(plain));
        }
    }
    if !info.linkedin_id.is_empty() {
        let id = escape_html(&info.linkedin_id);
        contact.push(format!(
            "<a href=\"https://www.linkedin.com/in/{id}\">linkedin.com/in/{id}</a>"
        ));
    }
    if !info.github_id.is_empty() {
        let id = escape_html(&info.github_id);
        contact.push(format!("<a href=\"https://github.com/{id}\">github.com/{id}</a>"));
    }
    if !contact.is_empty() {
        let _ = write!(html, "<p class=\"contact\">{}</p>", contact.join(" | "));
    }
    html.push_str("</header>");
    html
}

fn positions(items: &[Position], styling: &StylingBundle) -> String {
    let mut html = String::new();
    for p in items {
        let _ = write!(
            html,
            "<div class=\"entry\"><div class=\"entry-head\"><strong>{}</strong>\
             <span class=\"dates\">{}</span></div>\
             <div class=\"company\" style=\"color: {};\">{}</div>\
             <div class=\"rich-text\">{}</div></div>",
            escape_html(&p.title),
            date_range(&p.start_date, &p.end_date),
            escape_html(&styling.company_color),
            escape_html(&p.company),
            p.description
        );
    }
    html
}

fn educations(items: &[Education]) -> String {
    let mut html = String::new();
    for e in items {
        let degree = [e.degree.as_str(), e.field_of_study.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(escape_html)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            html,
            "<div class=\"entry\"><div class=\"entry-head\"><strong>{}</strong>\
             <span class=\"dates\">{}</span></div><div>{degree}</div></div>",
            escape_html(&e.school_name),
            date_range(&e.start_date, &e.end_date)
        );
    }
    html
}

fn skills(items: &[Skill], styling: &StylingBundle) -> String {
    match styling.skills_style {
        SkillsStyle::Chips => {
            let chips: String = items
                .iter()
                .map(|s| {
                    format!(
                        "<span class=\"chip\" style=\"border-color: {};\">{}</span>",
                        escape_html(&styling.border_color),
                        escape_html(&s.name)
                    )
                })
                .collect();
            format!("<div class=\"skills chips\">{chips}</div>")
        }
        SkillsStyle::List => {
            let names: Vec<String> = items.iter().map(|s| escape_html(&s.name)).collect();
            format!("<p class=\"skills list\">{}</p>", names.join(" • "))
        }
    }
}

fn projects(items: &[Project]) -> String {
    let mut html = String::new();
    for p in items {
        let title = if p.link.is_empty() {
            escape_html(&p.title)
        } else {
            format!(
                "<a href=\"{}\">{}</a>",
                escape_html(&p.link),
                escape_html(&p.title)
            )
        };
        let _ = write!(
            html,
            "<div class=\"entry\"><strong>{title}</strong><div class=\"rich-text\">{}</div></div>",
            p.description
        );
    }
    html
}

fn certifications(items: &[Certification]) -> String {
    let mut html = String::new();
    for c in items {
        let _ = write!(
            html,
            "<div class=\"entry\"><div class=\"entry-head\"><strong>{}</strong>\
             <span class=\"dates\">{}</span></div><div>{}</div>",
            escape_html(&c.title),
            format_month(&c.completion_date),
            escape_html(&c.organization)
        );
        if let Some(description) = c.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = write!(html, "<p>{}</p>", escape_html(description));
        }
        if let Some(url) = c.credential_url.as_deref().filter(|u| !u.is_empty()) {
            let _ = write!(html, "<a href=\"{}\">View credential</a>", escape_html(url));
        }
        html.push_str("</div>");
    }
    html
}

/// One section as an HTML fragment. Rich-text fields were sanitized on
/// write and are emitted verbatim; every other value is escaped here.
pub fn render_section(section: &AssembledSection, styling: &StylingBundle) -> String {
    let body = match &section.body {
        SectionBody::Header(info) => return header(info, styling),
        SectionBody::Summary(summary) => format!("<div class=\"rich-text\">{summary}</div>"),
        SectionBody::Positions(items) => positions(items, styling),
        SectionBody::Education(items) => educations(items),
        SectionBody::Skills(items) => skills(items, styling),
        SectionBody::Projects(items) => projects(items),
        SectionBody::Certifications(items) => certifications(items),
        SectionBody::Custom(content) => format!("<div class=\"rich-text\">{content}</div>"),
    };
    format!(
        "<section id=\"{}\" data-kind=\"{}\">{}{body}</section>",
        escape_html(&section.id),
        section.body.kind(),
        heading(&section.title, styling)
    )
}
