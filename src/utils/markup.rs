//! Markup stripping for free-text fields.
//!
//! Crossref abstracts arrive as JATS XML fragments and PubMed titles may carry
//! inline HTML. Both are reduced to plain text here.

use regex::{Captures, Regex};
use scraper::Html;
use std::sync::OnceLock;

/// Element tags, optionally namespaced (`jats:p`). Attributes must carry
/// quoted values, so comparisons like `x<y and y>z` are not tags.
const TAG_PATTERN: &str =
    r#"</?(?:[A-Za-z][\w.-]*:)?[A-Za-z][\w.-]*(?:\s+[\w:.-]+\s*=\s*(?:"[^"]*"|'[^']*'))*\s*/?>"#;

/// Semicolon-terminated character references only; legacy forms such as
/// `&not` without `;` stay literal.
const ENTITY_PATTERN: &str = r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);";

/// A character reference, or a bare `&`, `<` or `>` needing escape
const ESCAPE_PATTERN: &str = r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);|[&<>]";

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn tag_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, TAG_PATTERN)
}

fn entity_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, ENTITY_PATTERN)
}

fn escape_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, ESCAPE_PATTERN)
}

/// Strip tags and decode entities, keeping text content.
///
/// Tags become word breaks and whitespace runs collapse to one space. Text
/// without tag or entity syntax is only whitespace-normalized, so stray `<`,
/// `>` and `&` survive untouched.
///
/// The result is a fixed point: decoded text that would read as a tag or an
/// entity again (`&lt;i&gt;` decoding to `<i>`) is kept escaped.
pub fn strip_markup(text: &str) -> String {
    let (Some(tag), Some(entity), Some(escape)) = (tag_re(), entity_re(), escape_re()) else {
        return normalize_whitespace(text);
    };

    if !tag.is_match(text) && !entity.is_match(text) {
        return normalize_whitespace(text);
    }

    let untagged = tag.replace_all(text, " ");

    // html5ever would treat bare `<` or `&` as markup, so escape them first
    let escaped = escape.replace_all(&untagged, |caps: &Captures| match &caps[0] {
        "&" => "&amp;".to_string(),
        "<" => "&lt;".to_string(),
        ">" => "&gt;".to_string(),
        reference => reference.to_string(),
    });

    let fragment = Html::parse_fragment(&escaped);
    let decoded: String = fragment.root_element().text().collect();

    normalize_whitespace(&guard_markup(&decoded, tag, entity))
}

/// Re-escape decoded text that would be read as markup on another pass
fn guard_markup(text: &str, tag: &Regex, entity: &Regex) -> String {
    let entities = entity.replace_all(text, |caps: &Captures| {
        format!("&amp;{}", &caps[0][1..])
    });

    tag.replace_all(&entities, |caps: &Captures| {
        caps[0].replace('<', "&lt;").replace('>', "&gt;")
    })
    .into_owned()
}

/// Collapse whitespace runs to single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
