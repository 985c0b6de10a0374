//! Error types for loading and analysis
//!
//! Only input problems are errors. Unknown characters and zero-mention
//! characters are absorbed by the pipeline (empty scans, skipped mentions,
//! zero probabilities) and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading corpus inputs or saved analyses
#[derive(Error, Debug)]
pub enum FormulaicError {
    #[error("Missing input: cannot read {}: {source}", path.display())]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed {kind} record at {location}: {reason}")]
    MalformedRecord {
        kind: RecordKind,
        location: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which kind of input record was malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Character,
    Formula,
    Mention,
    Analysis,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Character => write!(f, "character"),
            RecordKind::Formula => write!(f, "formula"),
            RecordKind::Mention => write!(f, "mention"),
            RecordKind::Analysis => write!(f, "analysis"),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormulaicError>;
