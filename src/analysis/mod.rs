//! Deviation detection pipeline
//!
//! ```text
//! FormulaDatabase ──► PatternIndex ─┬──────────────────────────┐
//!                                   ▼                          ▼
//! mentions ─────────────► ExpectationModel ──► SurprisalScorer ──► rank()
//! ```
//!
//! Each stage is built once from its inputs and only read afterwards.

mod expectation;
mod patterns;
mod ranker;
mod scanner;
mod surprisal;

pub use expectation::{ExpectationModel, ExpectationProfile};
pub use patterns::PatternIndex;
pub use ranker::{
    by_character, high_surprisal, rank, CharacterBreakdown, DeviationRanking, DeviationSummary, RankOptions,
    Ranked, DEFAULT_HIGH_SURPRISAL_THRESHOLD, DEFAULT_PER_CHARACTER_TOP,
};
pub use scanner::{detect_formulae, scan_line};
pub use surprisal::{
    primary_formula, surprisal, SurprisalScorer, BARE_DEVIATION_THRESHOLD, FORMULA_DEVIATION_THRESHOLD,
};

use crate::corpus::FormulaDatabase;
use crate::models::{Mention, MentionAnalysis};
use tracing::info;

/// Output of a full pipeline run
#[derive(Debug, Clone)]
pub struct DeviationAnalysisRun {
    pub index: PatternIndex,
    pub model: ExpectationModel,
    /// One entry per mention with a profile, in input order
    pub analyses: Vec<MentionAnalysis>,
}

/// Index the database, fit the expectation model and score every mention
pub fn analyze(database: &FormulaDatabase, mentions: &[Mention]) -> DeviationAnalysisRun {
    let index = PatternIndex::build(database);
    info!(
        "Indexed {} formulae across {} characters",
        index.total_patterns(),
        index.len()
    );

    let model = ExpectationModel::build(mentions, &index);

    let analyses = SurprisalScorer::new(&index, &model).analyze_all(mentions);
    let skipped = mentions.len() - analyses.len();
    info!(
        "Analyzed {} of {} mentions ({} without a profile)",
        analyses.len(),
        mentions.len(),
        skipped
    );

    DeviationAnalysisRun {
        index,
        model,
        analyses,
    }
}
