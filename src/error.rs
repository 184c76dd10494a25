//! Error types for the QC pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, QcError>;

/// Errors that can occur while running the QC pipeline.
#[derive(Error, Debug)]
pub enum QcError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The document path does not exist.
    #[error("Document not found at '{0}'")]
    DocumentNotFound(PathBuf),

    /// The document exists but its text could not be extracted.
    #[error("Failed to extract text from '{path}': {message}")]
    Extraction { path: PathBuf, message: String },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// An external call did not complete within its bound.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The chatbot endpoint answered with a non-success status or an unusable body.
    #[error("Remote QA error: {0}")]
    RemoteQa(String),
}

impl QcError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an extraction error with path context.
    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for QcError {
    fn from(err: reqwest::Error) -> Self {
        QcError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for QcError {
    fn from(err: serde_json::Error) -> Self {
        QcError::LlmParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_operation() {
        let err = QcError::Timeout {
            operation: "audit",
            after: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "audit timed out after 3s");
    }

    #[test]
    fn test_extraction_error_carries_path() {
        let err = QcError::extraction("pdfs/seo.pdf", "bad xref");
        assert!(err.to_string().contains("pdfs/seo.pdf"));
        assert!(err.to_string().contains("bad xref"));
    }
}
