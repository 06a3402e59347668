//! URL slug derivation for posts and tags.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator regex"));

/// Lowercases `text` and joins its ASCII alphanumeric runs with `-`.
///
/// Returns an empty string when `text` has no ASCII alphanumerics.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    NON_SLUG_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
