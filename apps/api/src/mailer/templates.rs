use crate::document::sanitize::escape_html;
use crate::mailer::EmailMessage;
use crate::models::support::{BugReportRow, BugStatus, FeedbackRow};

pub const BUG_UPDATE_SUBJECT: &str = "Update on your reported bug";
pub const FEEDBACK_REPLY_SUBJECT: &str = "Thanks for your feedback";

const P_MUTED: &str = "margin: 0 0 8px 0; color: #6b7280; font-size: 13px;";
const P_BODY: &str = "margin: 0 0 12px 0; color: #4b5563; font-size: 14px; line-height: 1.6;";
const H2: &str = "margin: 0 0 16px 0; color: #111827; font-size: 20px; font-weight: 600;";

/// Notification for a reporter after an admin changed their bug report.
/// `None` when the report has no contact email.
pub fn bug_report_update(bug: &BugReportRow, app_base_url: &str) -> Option<EmailMessage> {
    let to = bug.email.as_deref().filter(|e| !e.trim().is_empty())?;
    let status = BugStatus::parse(&bug.status)
        .map(BugStatus::label)
        .unwrap_or("Updated");

    let mut html = format!(
        "<h2 style=\"{H2}\">Update on your reported bug</h2>\
         <p style=\"{P_BODY}\">We've updated the status of a bug you reported.</p>\
         <p style=\"{P_MUTED}\"><strong>Status:</strong> {status}</p>"
    );
    if let Some(comment) = bug.admin_comment.as_deref().filter(|c| !c.is_empty()) {
        html.push_str(&format!(
            "<p style=\"{P_BODY}\"><strong>Note from the team:</strong> {}</p>",
            escape_html(comment)
        ));
    }
    html.push_str(&format!(
        "<p style=\"{P_MUTED}\"><strong>Reported:</strong> {}</p>",
        bug.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(page) = bug.page_url.as_deref().filter(|p| !p.is_empty()) {
        html.push_str(&format!(
            "<p style=\"{P_MUTED}\"><strong>Page:</strong> {}</p>",
            escape_html(page)
        ));
    }
    let description = if bug.description.is_empty() {
        "(no description)".to_string()
    } else {
        escape_html(&bug.description)
    };
    html.push_str(&format!(
        "<p style=\"{P_MUTED} white-space: pre-line;\"><strong>Description:</strong> {description}</p>\
         <p style=\"{P_BODY}\">You can see the latest status of your bugs on the \
         <a href=\"{}/reported-bugs\">Reported Bugs</a> page.</p>",
        app_base_url.trim_end_matches('/')
    ));

    Some(EmailMessage {
        to: to.to_string(),
        subject: BUG_UPDATE_SUBJECT.to_string(),
        html,
    })
}

/// Reply to a feedback submission. `None` when there is no contact email.
pub fn feedback_reply(feedback: &FeedbackRow) -> Option<EmailMessage> {
    let to = feedback.email.as_deref().filter(|e| !e.trim().is_empty())?;

    let mut details = Vec::new();
    if let Some(mood) = feedback.mood.as_deref().filter(|m| !m.is_empty()) {
        details.push(format!("Mood: {}", escape_html(mood)));
    }
    if let Some(rating) = feedback.rating {
        details.push(format!("Rating: {rating}/5"));
    }

    let mut html = format!(
        "<h2 style=\"{H2}\">Thanks for your feedback</h2>\
         <p style=\"{P_BODY}\">We really appreciate you taking the time to share your thoughts.</p>"
    );
    if !details.is_empty() {
        html.push_str(&format!("<p style=\"{P_MUTED}\">{}</p>", details.join(" · ")));
    }
    if let Some(message) = feedback.message.as_deref().filter(|m| !m.is_empty()) {
        html.push_str(&format!(
            "<p style=\"{P_BODY} white-space: pre-line;\"><strong>Your feedback:</strong> {}</p>",
            escape_html(message)
        ));
    }
    if let Some(reply) = feedback.admin_reply.as_deref().filter(|r| !r.is_empty()) {
        html.push_str(&format!(
            "<p style=\"{P_BODY}\"><strong>Our reply:</strong> {}</p>",
            escape_html(reply)
        ));
    }

    Some(EmailMessage {
        to: to.to_string(),
        subject: FEEDBACK_REPLY_SUBJECT.to_string(),
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn bug() -> BugReportRow {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        BugReportRow {
            id: Uuid::new_v4(),
            external_user_id: Some("user_1".into()),
            email: Some("ada@example.com".into()),
            page_url: Some("https://app.example.com/editor".into()),
            description: "Preview <b>breaks</b>".into(),
            screenshot_url: None,
            status: "in_progress".into(),
            admin_comment: Some("Looking into it".into()),
            created_at: created,
            updated_at: created,
        }
    }

    fn feedback() -> FeedbackRow {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        FeedbackRow {
            id: Uuid::new_v4(),
            external_user_id: None,
            email: Some("ada@example.com".into()),
            rating: Some(4),
            mood: Some("happy".into()),
            message: Some("Love it".into()),
            admin_reply: Some("Thank you!".into()),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_bug_update_email() {
        let msg = bug_report_update(&bug(), "https://app.example.com/").unwrap();
        assert_eq!(msg.to, "ada@example.com");
        assert_eq!(msg.subject, BUG_UPDATE_SUBJECT);
        assert!(msg.html.contains("<strong>Status:</strong> In Progress"));
        assert!(msg.html.contains("Looking into it"));
        assert!(msg.html.contains("2024-03-01 09:30 UTC"));
        assert!(msg.html.contains("https://app.example.com/reported-bugs"));
    }

    #[test]
    fn test_bug_update_escapes_user_text() {
        let msg = bug_report_update(&bug(), "https://app.example.com").unwrap();
        assert!(msg.html.contains("Preview &lt;b&gt;breaks&lt;/b&gt;"));
    }

    #[test]
    fn test_no_email_means_no_message() {
        let mut b = bug();
        b.email = None;
        assert!(bug_report_update(&b, "https://app.example.com").is_none());
        let mut f = feedback();
        f.email = Some("  ".into());
        assert!(feedback_reply(&f).is_none());
    }

    #[test]
    fn test_feedback_reply_email() {
        let msg = feedback_reply(&feedback()).unwrap();
        assert!(msg.html.contains("Mood: happy · Rating: 4/5"));
        assert!(msg.html.contains("<strong>Your feedback:</strong> Love it"));
        assert!(msg.html.contains("<strong>Our reply:</strong> Thank you!"));
    }
}
