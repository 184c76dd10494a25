//! Score extraction from free-form auditor output.
//!
//! The auditor is asked for a 0-100 score with justification, but its reply
//! is unstructured text. Two readings are supported:
//! - [`ScoreStrategy::BareNumber`]: the first standalone run of 1-3 digits
//! - [`ScoreStrategy::Labeled`]: the digits after a literal `Score:` label
//!
//! Extraction never fails: when nothing matches, [`DEFAULT_SCORE`] is used.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Score assigned when the auditor text contains no usable number.
pub const DEFAULT_SCORE: u32 = 50;

/// Upper bound of the audit scale.
pub const MAX_SCORE: u32 = 100;

lazy_static! {
    static ref BARE_NUMBER: Regex = Regex::new(r"\b([0-9]{1,3})\b").unwrap();
    static ref LABELED: Regex = Regex::new(r"Score:\s*([0-9]+)").unwrap();
}

/// How a score is read out of auditor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStrategy {
    /// First standalone 1-3 digit number anywhere in the text.
    #[default]
    BareNumber,
    /// Digits following a `Score:` label.
    Labeled,
}

impl ScoreStrategy {
    /// Extract a score with this strategy, falling back to [`DEFAULT_SCORE`].
    ///
    /// The returned value is not clamped; see [`clamp_score`].
    pub fn extract(&self, text: &str) -> u32 {
        let found = match self {
            ScoreStrategy::BareNumber => find_bare_number(text),
            ScoreStrategy::Labeled => extract_labeled_score(text),
        };
        found.unwrap_or(DEFAULT_SCORE)
    }
}

/// Return the first standalone run of 1-3 digits, or [`DEFAULT_SCORE`].
///
/// Values above 100 (up to 999) are returned as found.
pub fn extract_score(text: &str) -> u32 {
    ScoreStrategy::BareNumber.extract(text)
}

/// Return the number after the first `Score:` label, if any.
pub fn extract_labeled_score(text: &str) -> Option<u32> {
    LABELED
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn find_bare_number(text: &str) -> Option<u32> {
    BARE_NUMBER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Clamp a raw extracted score onto the 0-100 audit scale.
pub fn clamp_score(raw: u32) -> u32 {
    raw.min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_digits_defaults_to_fifty() {
        assert_eq!(extract_score("The answer is accurate and clear."), 50);
        assert_eq!(extract_score("Score: excellent"), 50);
        assert_eq!(extract_score(""), 50);
    }

    #[test]
    fn test_first_number_wins() {
        assert_eq!(extract_score("I would rate this 85 out of 100."), 85);
        assert_eq!(extract_score("Score: 92\nJustification: covers 3 points"), 92);
        assert_eq!(extract_score("7/10 relevance, overall 70"), 7);
    }

    #[test]
    fn test_not_clamped_by_extractor() {
        assert_eq!(extract_score("Rating 999 (typo)"), 999);
        assert_eq!(clamp_score(999), 100);
        assert_eq!(clamp_score(42), 42);
    }

    #[test]
    fn test_requires_standalone_run() {
        // Four digits is not a 1-3 digit run, and embedded digits need word boundaries.
        assert_eq!(extract_score("Reviewed in 2024 by gpt4"), 50);
        assert_eq!(extract_score("Reviewed in 2024: 88"), 88);
    }

    #[test]
    fn test_only_ascii_digits_count() {
        assert_eq!(extract_score("Rated \u{FF13} then 85"), 85);
        assert_eq!(extract_score("Score: \u{0669}\u{0665}"), 50);
        assert_eq!(extract_labeled_score("Score: \u{0669}\u{0665}"), None);
    }

    #[test]
    fn test_labeled_strategy() {
        let text = "Reviewed 3 criteria.\nScore: 95\nWell grounded.";
        assert_eq!(extract_labeled_score(text), Some(95));
        assert_eq!(ScoreStrategy::Labeled.extract(text), 95);
        assert_eq!(ScoreStrategy::BareNumber.extract(text), 3);
        assert_eq!(extract_labeled_score("no label 80"), None);
        assert_eq!(ScoreStrategy::Labeled.extract("no label 80"), DEFAULT_SCORE);
    }

    #[test]
    fn test_strategy_deserializes_snake_case() {
        let strategy: ScoreStrategy = serde_json::from_str("\"bare_number\"").unwrap();
        assert_eq!(strategy, ScoreStrategy::BareNumber);
        let strategy: ScoreStrategy = serde_json::from_str("\"labeled\"").unwrap();
        assert_eq!(strategy, ScoreStrategy::Labeled);
    }
}
