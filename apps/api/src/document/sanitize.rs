//! Text sanitization applied before anything is stored.
//!
//! Plain-text fields lose every tag. Rich-text fields keep a small allow-list
//! of formatting tags; links keep `href` only and get a fixed `rel`.

use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};

const RICH_TEXT_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "s", "ul", "ol", "li", "a",
];

/// Strips all markup. Script and style bodies are dropped entirely; the text
/// of other elements is kept. The result is raw text, not HTML: anything
/// that writes it into markup escapes it there.
pub fn plain_text(input: &str) -> String {
    let cleaned = Builder::empty().clean(input).to_string();
    decode_text_entities(&cleaned)
}

/// Reverses the escaping the HTML serializer applies to text nodes.
/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
fn decode_text_entities(serialized: &str) -> String {
    serialized
        .replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Keeps only the formatting allow-list.
pub fn rich_text(input: &str) -> String {
    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", HashSet::from(["href"]));

    Builder::default()
        .tags(RICH_TEXT_TAGS.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .url_relative(UrlRelative::Deny)
        .link_rel(Some("noopener noreferrer"))
        .clean(input)
        .to_string()
}

/// Escapes text for interpolation into HTML output.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
