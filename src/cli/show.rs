//! Show command - re-rank a saved JSON analysis

use super::output::{emit, filter_character};
use anyhow::{Context, Result};
use formulaic::analysis::RankOptions;
use formulaic::config::ProjectConfig;
use formulaic::corpus::{load_deviation_analysis, Strictness};
use formulaic::reporters::OutputFormat;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Default)]
pub(super) struct ShowFlags {
    pub threshold: Option<f64>,
    pub top: Option<usize>,
    pub per_character: Option<usize>,
    pub format: Option<String>,
    pub deviations_only: bool,
    pub character: Option<String>,
}

/// Run the show command
pub(super) fn run(config: &ProjectConfig, path: &Path, flags: ShowFlags) -> Result<()> {
    let saved = load_deviation_analysis(path, Strictness::from_flag(config.inputs.strict))
        .with_context(|| format!("Failed to load saved analysis {}", path.display()))?;
    info!(
        "Loaded {} analyses (saved at threshold {:.2})",
        saved.all_analyses.len(),
        saved.high_surprisal_threshold
    );

    let options = RankOptions {
        threshold: flags.threshold.unwrap_or(saved.high_surprisal_threshold),
        per_character_top: flags.per_character.unwrap_or(config.ranking.per_character_top),
        deviations_only: flags.deviations_only,
    };
    let format = OutputFormat::from_str(flags.format.as_deref().unwrap_or(&config.output.format))?;
    let records = filter_character(saved.all_analyses, flags.character.as_deref());

    emit(
        &records,
        &options,
        flags.top.unwrap_or(config.ranking.top),
        &[],
        format,
        None,
    )
}
