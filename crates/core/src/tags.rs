//! Delimited-field extraction from free-form model output.
//!
//! Fields are wrapped in the same literal marker on both sides,
//! `<name>value<name>`, so the model only has to repeat one short token.

use tracing::warn;

/// Extract the text between the first `<tag>` and the next `<tag>`.
///
/// Spans newlines. Returns `None` when either marker is missing.
pub fn extract_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let marker = format!("<{}>", tag);
    let start = text.find(&marker)? + marker.len();
    let len = text[start..].find(&marker)?;
    Some(&text[start..start + len])
}

/// Like [`extract_tag`], but an absent field becomes an empty string.
pub fn extract_tag_or_default(text: &str, tag: &str) -> String {
    match extract_tag(text, tag) {
        Some(value) => value.to_string(),
        None => {
            warn!(tag = tag, "Tag not found in model output");
            String::new()
        }
    }
}

/// Surround `content` with the `<tag>` marker on both sides.
pub fn wrap_tag(content: &str, tag: &str) -> String {
    format!("<{tag}>{content}<{tag}>")
}
