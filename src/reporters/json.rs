//! JSON reporter
//!
//! Writes the flat `deviation_analysis.json` document: every analysis plus
//! the high-surprisal count and threshold used.

use super::DeviationReport;
use crate::analysis::Ranked;
use crate::corpus::{AnalysisRecord, DeviationAnalysis};
use anyhow::Result;

fn to_document<T: Ranked>(report: &DeviationReport<'_, T>) -> DeviationAnalysis {
    DeviationAnalysis {
        all_analyses: report.analyses.iter().map(AnalysisRecord::from_ranked).collect(),
        high_surprisal_count: report.ranking.high_surprisal.len(),
        high_surprisal_threshold: report.ranking.threshold,
    }
}

/// Render report as JSON
pub fn render<T: Ranked>(report: &DeviationReport<'_, T>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_document(report))?)
}
