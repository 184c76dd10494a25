//! Parsing paraphrase output into question variants.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ENUMERATION: Regex = Regex::new(r"^[0-9]+\.(?:\s+|$)").unwrap();
}

/// Remove a leading `N. ` enumeration marker from a line.
pub fn strip_enumeration(line: &str) -> &str {
    match ENUMERATION.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Split paraphrase output into cleaned, non-blank variant texts.
///
/// At most `limit` variants are kept, in the order they appear.
pub fn parse_variants(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_enumeration(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .take(limit)
        .collect()
}
