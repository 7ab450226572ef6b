//! Text conversion helpers

use lazy_static::lazy_static;
use regex::Regex;

/// Generate a URL-safe slug from arbitrary text
///
/// # Examples
/// ```ignore
/// slugify("Getting Started!") // -> "getting-started"
/// ```
pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// Turn a slug-like string into display text
///
/// # Examples
/// ```ignore
/// humanize("web-development") // -> "Web development"
/// ```
pub fn humanize(text: &str) -> String {
    lazy_static! {
        static ref SEPARATORS: Regex = Regex::new(r"[-_]+").unwrap();
    }

    let spaced = SEPARATORS.replace_all(text.trim(), " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Strip Markdown and HTML markup, leaving plain text
pub fn plainify(text: &str) -> String {
    lazy_static! {
        static ref FENCE_LINE: Regex = Regex::new(r"(?m)^(`{3,}|~{3,}).*$").unwrap();
        static ref IMAGE: Regex = Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap();
        static ref LINK: Regex = Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap();
        static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
        static ref MARKERS: Regex = Regex::new(r"[*_~`#>]+").unwrap();
        static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    }

    let text = FENCE_LINE.replace_all(text, "");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = HTML_TAG.replace_all(&text, "");
    let text = MARKERS.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Truncate to at most `limit` characters, cutting on a char boundary
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect::<String>().trim_end().to_string()
}
