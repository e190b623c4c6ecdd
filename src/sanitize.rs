//! Text clean-up for user-supplied fields.

use regex::Regex;

lazy_static::lazy_static! {
    static ref TAG: Regex = Regex::new(r"<[^>]*>?").expect("tag pattern");
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9]+").expect("slug pattern");
}

/// Removes markup tags from `input`.
pub fn strip_tags(input: &str) -> String {
    TAG.replace_all(input, "").into_owned()
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trims, strips tags, then escapes what is left.
pub fn clean(input: &str) -> String {
    escape_html(&strip_tags(input.trim()))
}

/// Lowercases and collapses every run of non `[a-z0-9]` into a single `-`.
/// Falls back to `article` when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = NON_SLUG.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "article".to_string()
    } else {
        slug.to_string()
    }
}

/// `slugify(title)` plus the last four digits of `unix_secs`.
pub fn slug_with_suffix(title: &str, unix_secs: i64) -> String {
    format!("{}-{:04}", slugify(title), unix_secs.rem_euclid(10_000))
}
