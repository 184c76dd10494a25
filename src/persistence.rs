//! Persistence layer for saving/loading batch summaries.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.

use crate::error::{QcError, Result};
use crate::summary::BatchSummary;
use std::fs;
use std::path::Path;

/// Save format for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json, // Default to JSON
        }
    }
}

/// Save a BatchSummary to a file.
pub fn save_summary(summary: &BatchSummary, path: &Path) -> Result<()> {
    let format = SaveFormat::from_path(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| QcError::io(parent, e))?;
        }
    }

    let data = match format {
        SaveFormat::Json => serde_json::to_string_pretty(summary)
            .map_err(|e| QcError::Serialization(e.to_string()))?
            .into_bytes(),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::encode_to_vec(summary, config)
                .map_err(|e| QcError::Serialization(e.to_string()))?
        }
    };

    fs::write(path, &data).map_err(|e| QcError::io(path, e))?;

    Ok(())
}

/// Load a BatchSummary from a file.
pub fn load_summary(path: &Path) -> Result<BatchSummary> {
    if !path.exists() {
        return Err(QcError::DocumentNotFound(path.to_path_buf()));
    }

    let data = fs::read(path).map_err(|e| QcError::io(path, e))?;

    let summary: BatchSummary = match SaveFormat::from_path(path) {
        SaveFormat::Json => serde_json::from_slice(&data)
            .map_err(|e| QcError::Serialization(e.to_string()))?,
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (summary, _): (BatchSummary, usize) = bincode::decode_from_slice(&data, config)
                .map_err(|e| QcError::Serialization(e.to_string()))?;
            summary
        }
    };

    Ok(summary)
}
