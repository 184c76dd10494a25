//! Per-document batch summary.
//!
//! Every input document gets exactly one entry, either a numeric score or a
//! sentinel describing why no score exists.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome recorded for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Mean audit score of the document's scored questions.
    Scored { score: u32 },
    /// The document path did not resolve.
    NotFound,
    /// Extraction produced no questions.
    NoQuestionsFound,
    /// Questions were found but every one was skipped for lack of variants.
    NoScoredQuestions,
    /// Question processing failed; the rest of the document was abandoned.
    ProcessingError { detail: String },
}

impl DocumentOutcome {
    pub fn score(&self) -> Option<u32> {
        match self {
            DocumentOutcome::Scored { score } => Some(*score),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentOutcome::Scored { score } => write!(f, "{}", score),
            DocumentOutcome::NotFound => f.write_str("File not found"),
            DocumentOutcome::NoQuestionsFound => f.write_str("No questions found"),
            DocumentOutcome::NoScoredQuestions => f.write_str("Score not found"),
            DocumentOutcome::ProcessingError { .. } => f.write_str("Error in processing"),
        }
    }
}

/// One row of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct SummaryEntry {
    pub document: String,
    pub outcome: DocumentOutcome,
}

/// Ordered mapping from document identifier to outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct BatchSummary {
    pub entries: Vec<SummaryEntry>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document's outcome, replacing any earlier entry for it.
    pub fn record(&mut self, document: impl Into<String>, outcome: DocumentOutcome) {
        let document = document.into();
        match self.entries.iter_mut().find(|e| e.document == document) {
            Some(entry) => entry.outcome = outcome,
            None => self.entries.push(SummaryEntry { document, outcome }),
        }
    }

    pub fn get(&self, document: &str) -> Option<&DocumentOutcome> {
        self.entries
            .iter()
            .find(|e| e.document == document)
            .map(|e| &e.outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Documents that received a numeric score, in batch order.
    pub fn scored(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.score().map(|s| (e.document.as_str(), s)))
    }

    /// Mean of the numeric document scores, if any.
    pub fn mean_score(&self) -> Option<f64> {
        let scores: Vec<u32> = self.scored().map(|(_, s)| s).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<u32>() as f64 / scores.len() as f64)
        }
    }

    /// Log every entry at info level.
    pub fn log(&self) {
        tracing::info!("--- Summary of Scores ---");
        for entry in &self.entries {
            match &entry.outcome {
                DocumentOutcome::ProcessingError { detail } => {
                    tracing::info!(document = %entry.document, error = %detail, "{}", entry.outcome)
                }
                outcome => tracing::info!(document = %entry.document, "{}", outcome),
            }
        }
    }

    /// Two-column text table of every document and its outcome.
    pub fn format_table(&self) -> String {
        let width = self
            .entries
            .iter()
            .map(|e| e.document.chars().count())
            .max()
            .unwrap_or(0)
            .max("Document".len());

        let mut out = String::new();
        out.push_str(&format!("{:<width$}  {}\n", "Document", "Score", width = width));
        out.push_str(&format!("{}\n", "─".repeat(width + 22)));
        for entry in &self.entries {
            out.push_str(&format!(
                "{:<width$}  {}\n",
                entry.document,
                entry.outcome,
                width = width
            ));
        }
        out
    }

    /// Horizontal bar chart of the numeric scores, or `None` if there are none.
    ///
    /// Each `█` is two points on the 0-100 scale.
    pub fn format_chart(&self) -> Option<String> {
        let scored: Vec<(&str, u32)> = self.scored().collect();
        if scored.is_empty() {
            tracing::warn!("No valid scores found to plot");
            return None;
        }

        let width = scored.iter().map(|(d, _)| d.chars().count()).max().unwrap_or(0);
        let mut out = String::from("Summary of Scores for Each Document\n");
        for (document, score) in scored {
            let bar = "█".repeat((score.min(100) / 2) as usize);
            out.push_str(&format!(
                "{:>width$} │{} {}\n",
                document,
                bar,
                score,
                width = width
            ));
        }
        Some(out)
    }
}
