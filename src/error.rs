//! Error handling for sounding processing operations.
//!
//! Covers structural parse failures, gradient computation on unusable
//! tables, fetch failures reported by the raw-text supplier, and the
//! storage/configuration errors around them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoundingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed sounding in {file} at line {line}: {reason}")]
    MalformedSounding {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Insufficient data for gradient computation: {reason}")]
    InsufficientData { reason: String },

    #[error("Fetch failed for station {station} ({url}): {reason}")]
    Fetch {
        station: String,
        url: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unknown station code in {file}: {reason}")]
    UnknownStation { file: String, reason: String },

    #[error("Unsupported storage schema version {found} in {path} (expected {expected})")]
    UnsupportedSchema {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Corrupt station store {path}: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Rendering failed for {path}: {reason}")]
    Render { path: PathBuf, reason: String },
}

impl SoundingError {
    /// Create a malformed-sounding error for a 1-based line number
    pub fn malformed(file: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedSounding {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SoundingError>;
