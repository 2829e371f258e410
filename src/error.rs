/*!
 * Error handling for the visitas pipeline
 *
 * Dataset-level structural failures (missing columns, unreadable files) are
 * errors; per-row conditions (malformed classification text, unresolved codes,
 * unparseable dates, bad coordinates) are not. Those are represented
 * structurally in the output and surfaced through diagnostic counters.
 */

use std::fmt;
use std::path::PathBuf;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// visitas library result type
pub type Result<T> = std::result::Result<T, VisitasError>;

/// Error types for dataset ingestion, configuration, and export
#[derive(Error, Debug)]
pub enum VisitasError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        path: Option<PathBuf>,
    },

    /// A required column is absent from a dataset header row.
    ///
    /// Terminal for the whole run: no partial output is produced.
    #[error("required column '{column}' not found in {dataset} dataset")]
    MissingRequiredColumn {
        column: String,
        dataset: String,
        available: Vec<String>,
    },

    /// Date parsing errors for caller-supplied window bounds
    #[error("cannot parse '{value}' as date")]
    DateParse {
        value: String,
        expected_format: String,
    },

    /// Export errors
    #[error("export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Export format for error context and CLI selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl VisitasError {
    /// Create a missing-column error listing what the header actually contained
    pub fn missing_column(column: &str, dataset: &str, available: &[String]) -> Self {
        Self::MissingRequiredColumn {
            column: column.to_string(),
            dataset: dataset.to_string(),
            available: available.to_vec(),
        }
    }

    /// Create a date parsing error with format information
    pub fn date_parse_with_format(value: &str, expected_format: &str) -> Self {
        Self::DateParse {
            value: value.to_string(),
            expected_format: expected_format.to_string(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingRequiredColumn { available, .. } => {
                format!("{}\n\nColumns present: {}", self, available.join(", "))
            }
            Self::DateParse { expected_format, .. } => {
                format!("{}\n\nExpected format: {}", self, expected_format)
            }
            Self::Configuration { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for VisitasError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            path: None,
        }
    }
}

impl From<csv::Error> for VisitasError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line() as usize);
        Self::CsvParse {
            message: err.to_string(),
            line,
            path: None,
        }
    }
}

impl From<serde_json::Error> for VisitasError {
    fn from(err: serde_json::Error) -> Self {
        VisitasError::Export {
            message: err.to_string(),
            format: ExportFormat::Json,
        }
    }
}
