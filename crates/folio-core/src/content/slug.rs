//! URL slug generation.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| {
    // Static pattern, cannot fail
    Regex::new(r"[^a-z0-9]+").unwrap()
});

/// Turns a title into a URL slug.
///
/// Lowercases, collapses every run of non `[a-z0-9]` characters into one `-`
/// and trims dashes from both ends.
///
/// # Examples
///
/// ```
/// use folio_core::content::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// ```
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
