//! Saved deviation analysis (`deviation_analysis.json`)
//!
//! The flat record format written by the JSON reporter and read back by
//! `formulaic show`. Infinite surprisal is stored as 999 and restored as
//! infinite on load.

use super::{read_json, Strictness};
use crate::analysis::Ranked;
use crate::error::{FormulaicError, RecordKind, Result};
use crate::models::{deserialize_line_num, Classification, Surprisal};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One analyzed mention in flat form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(deserialize_with = "deserialize_line_num")]
    pub line_num: u32,
    pub character: String,
    pub line: String,
    #[serde(rename = "type")]
    pub classification: Classification,
    pub probability: f64,
    pub surprisal: Surprisal,
    #[serde(default)]
    pub is_deviation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_formulae: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_formula: Option<String>,
}

impl AnalysisRecord {
    /// Flatten any ranked entry. Formula fields are only written for
    /// formulaic mentions.
    pub fn from_ranked<T: Ranked>(item: &T) -> Self {
        let formulaic = item.classification() == Classification::Formulaic;
        Self {
            line_num: item.line_num(),
            character: item.character().to_string(),
            line: item.line().to_string(),
            classification: item.classification(),
            probability: item.probability(),
            surprisal: item.surprisal(),
            is_deviation: item.is_deviation(),
            detected_formulae: formulaic
                .then(|| item.detected_formulae().into_iter().map(str::to_string).collect()),
            primary_formula: if formulaic {
                item.primary_formula().map(str::to_string)
            } else {
                None
            },
        }
    }
}

impl Ranked for AnalysisRecord {
    fn character(&self) -> &str {
        &self.character
    }

    fn line_num(&self) -> u32 {
        self.line_num
    }

    fn line(&self) -> &str {
        &self.line
    }

    fn classification(&self) -> Classification {
        self.classification
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn surprisal(&self) -> Surprisal {
        self.surprisal
    }

    fn is_deviation(&self) -> bool {
        self.is_deviation
    }

    fn primary_formula(&self) -> Option<&str> {
        self.primary_formula.as_deref()
    }

    fn detected_formulae(&self) -> Vec<&str> {
        self.detected_formulae
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .collect()
    }
}

/// Top-level document of a saved analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationAnalysis {
    pub all_analyses: Vec<AnalysisRecord>,
    pub high_surprisal_count: usize,
    pub high_surprisal_threshold: f64,
}

/// Load a saved analysis, applying the record policy to broken entries
pub fn load_deviation_analysis(path: &Path, strictness: Strictness) -> Result<DeviationAnalysis> {
    let value = read_json(path)?;
    parse_deviation_analysis(&value, strictness)
}

pub fn parse_deviation_analysis(value: &Value, strictness: Strictness) -> Result<DeviationAnalysis> {
    let malformed = |location: &str, reason: String| FormulaicError::MalformedRecord {
        kind: RecordKind::Analysis,
        location: location.to_string(),
        reason,
    };

    let Some(items) = value.get("all_analyses").and_then(Value::as_array) else {
        return Err(malformed("<root>", "missing `all_analyses` list".into()));
    };

    let mut all_analyses = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match AnalysisRecord::deserialize(item) {
            Ok(record) => all_analyses.push(record),
            Err(e) => strictness.handle(malformed(&format!("all_analyses[{i}]"), e.to_string()))?,
        }
    }

    Ok(DeviationAnalysis {
        all_analyses,
        high_surprisal_count: value
            .get("high_surprisal_count")
            .and_then(Value::as_u64)
            .map_or(0, |n| n as usize),
        high_surprisal_threshold: value
            .get("high_surprisal_threshold")
            .and_then(Value::as_f64)
            .unwrap_or(crate::analysis::DEFAULT_HIGH_SURPRISAL_THRESHOLD),
    })
}
