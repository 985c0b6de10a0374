//! Corpus inputs: the confirmed-formula database, the mention list and
//! previously saved analyses
//!
//! The first two are produced by upstream tooling (line extraction and
//! manual formula review). Loading is record-by-record so that a single
//! broken entry can be skipped with a warning, or rejected in strict mode.

mod database;
mod mentions;
mod saved;

pub use database::{load_formula_database, CharacterEntry, FormulaDatabase, FormulaEntry};
pub use mentions::{load_mentions, parse_mentions};
pub use saved::{load_deviation_analysis, parse_deviation_analysis, AnalysisRecord, DeviationAnalysis};

use crate::error::{FormulaicError, Result};
use std::path::Path;

/// How to treat records that are missing required fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Skip the record and log a warning
    #[default]
    Lenient,
    /// Abort loading with `MalformedRecord`
    Strict,
}

impl Strictness {
    pub fn from_flag(strict: bool) -> Self {
        if strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    /// Apply the policy to a malformed record: `Ok(())` means skip it.
    pub(crate) fn handle(self, err: FormulaicError) -> Result<()> {
        match self {
            Strictness::Strict => Err(err),
            Strictness::Lenient => {
                tracing::warn!("Skipping record: {}", err);
                Ok(())
            }
        }
    }
}

/// Read a JSON input file. Unreadable or absent files are `MissingInput`.
pub(crate) fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|source| FormulaicError::MissingInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| FormulaicError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
