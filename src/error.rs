//! Error types for export extraction.
//!
//! Row-level errors are recovered from: the row is skipped and recorded in the
//! extraction summary. A `FileFormatError` rejects one whole sheet but never the
//! other sheets handed in with it.

use chrono::NaiveDateTime;
use thiserror::Error;

/// A single row could not be interpreted
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row}: field '{field}' {reason}")]
pub struct RowParseError {
    /// Zero-based position of the row within its sheet
    pub row: usize,
    pub field: String,
    pub reason: String,
}

impl RowParseError {
    pub fn missing(row: usize, field: &str) -> Self {
        Self {
            row,
            field: field.to_string(),
            reason: "is missing or empty".to_string(),
        }
    }

    pub fn invalid(row: usize, field: &str, reason: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A row parsed but its end precedes its start
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row}: recording ends ({end}) before it starts ({start})")]
pub struct InvalidDurationError {
    pub row: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Why a row was skipped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error(transparent)]
    Parse(#[from] RowParseError),

    #[error(transparent)]
    InvalidDuration(#[from] InvalidDurationError),
}

impl RowError {
    /// Position of the offending row within its sheet
    pub fn row(&self) -> usize {
        match self {
            RowError::Parse(e) => e.row,
            RowError::InvalidDuration(e) => e.row,
        }
    }
}

/// A sheet lacks columns the export format requires
#[derive(Debug, Clone, PartialEq, Error)]
#[error("sheet '{document}' is missing required columns: {}", .missing.join(", "))]
pub struct FileFormatError {
    pub document: String,
    pub missing: Vec<String>,
}
