//! Print-ready HTML preview of an assembled resume.

pub mod sections;

use crate::document::assembler::{assemble_document, AssembledSection, SectionBody};
use crate::document::model::{ResumeDocument, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use crate::document::order::SectionOrder;
use crate::document::sanitize::escape_html;

use self::sections::render_section;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Default,
    /// Left colour bar; the header spans both columns.
    Modern,
}

impl Template {
    /// Unknown names render with the default template.
    pub fn from_name(name: &str) -> Self {
        match name {
            "modern" => Template::Modern,
            _ => Template::Default,
        }
    }
}

/// Scale transform for the preview. Above 100% the width shrinks so the
/// scaled page still fits its container.
pub fn zoom_style(zoom: u16) -> String {
    let zoom = if (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        zoom
    } else {
        DEFAULT_ZOOM
    };
    let scale = f64::from(zoom) / 100.0;
    let width = if zoom > 100 {
        format!("{:.2}%", 10_000.0 / f64::from(zoom))
    } else {
        "100%".to_string()
    };
    format!("transform: scale({scale}); transform-origin: top center; width: {width}; margin: 0 auto;")
}

const BASE_CSS: &str = "body{margin:0;font-family:Inter,system-ui,sans-serif;color:#1f2937}\
.resume-page{max-width:210mm;min-height:297mm;box-sizing:border-box;border-top:4px solid}\
.section-heading{font-size:1rem;margin:16px 0 8px}\
.entry{margin-bottom:8px}.entry-head{display:flex;justify-content:space-between}\
.chip{display:inline-block;border:1px solid;border-radius:9999px;padding:2px 8px;margin:2px}\
.modern{display:grid;grid-template-columns:2rem 1fr}.modern .bar{height:100%}\
@media print{.resume-page{transform:none!important;width:auto!important}}";

pub fn render_sections(sections: &[AssembledSection], doc: &ResumeDocument) -> String {
    let template = Template::from_name(&doc.template);
    let styling = &doc.styling;
    let body: String = sections
        .iter()
        .map(|section| render_section(section, styling))
        .collect();

    let inner = match template {
        Template::Default => format!("<div class=\"default\" style=\"padding: 8px 16px;\">{body}</div>"),
        Template::Modern => format!(
            "<div class=\"modern\"><div class=\"bar\" style=\"background-color: {};\"></div>\
             <div style=\"padding: 24px 24px 24px 0;\">{body}</div></div>",
            escape_html(&styling.border_color)
        ),
    };

    let title = sections
        .iter()
        .find_map(|s| match &s.body {
            SectionBody::Header(info) => Some(info.full_name()),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Resume".to_string());

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{BASE_CSS}</style></head><body>\
         <div class=\"resume-page\" style=\"border-top-color: {}; background-color: {}; {}\">{inner}</div>\
         </body></html>",
        escape_html(&title),
        escape_html(&styling.border_color),
        escape_html(&styling.resume_background_color),
        zoom_style(doc.zoom)
    )
}

/// Assembles and renders a document with the given section order.
pub fn render_preview(doc: &ResumeDocument, order: &SectionOrder) -> String {
    let sections = assemble_document(doc, order);
    render_sections(&sections, doc)
}
