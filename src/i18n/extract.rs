//! Extraction of translatable text spans from page HTML.
//!
//! A translatable span is wrapped in `{{ }}` markers directly in the page
//! source, e.g. `<h1>{{Happy Customer.}}</h1>`. The full matched substring
//! including the delimiters is used as the dictionary key, so editing the
//! source text creates a fresh key instead of silently mutating an
//! existing translation.

use regex::Regex;
use std::sync::LazyLock;

/// Non-greedy, newline-spanning wrapped-text pattern.
static WRAPPED_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").unwrap());

/// Return every wrapped span in document order, delimiters included.
pub fn extract_wrapped_text(html: &str) -> Vec<&str> {
    WRAPPED_TEXT.find_iter(html).map(|m| m.as_str()).collect()
}

/// Strip the `{{ }}` delimiters from a dictionary key.
pub fn strip_delimiters(key: &str) -> &str {
    key.strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
        .unwrap_or(key)
}
