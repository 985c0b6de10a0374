//! Shared report output for `analyze` and `show`

use anyhow::{Context, Result};
use console::style;
use formulaic::analysis::{RankOptions, Ranked};
use formulaic::reporters::{self, DeviationReport, OutputFormat};
use std::path::Path;

/// Render and emit a report to `output_path`, or stdout when absent.
///
/// The per-character breakdown follows `character_order`; characters not
/// listed there keep first-appearance order.
pub(super) fn emit<T: Ranked>(
    analyses: &[T],
    options: &RankOptions,
    top: usize,
    character_order: &[&str],
    format: OutputFormat,
    output_path: Option<&Path>,
) -> Result<()> {
    let report =
        DeviationReport::new(analyses, options, top).with_character_order(character_order.iter().copied());
    let rendered = reporters::report_with_format(&report, format)?;

    if let Some(path) = output_path {
        std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        // stderr keeps stdout clean for piping
        eprintln!("Report written to: {}", style(path.display()).cyan());
    } else {
        println!("{}", rendered);
    }
    Ok(())
}

/// Keep only one character's entries, if a filter is set
pub(super) fn filter_character<T: Ranked>(items: Vec<T>, character: Option<&str>) -> Vec<T> {
    match character {
        Some(name) => items.into_iter().filter(|a| a.character() == name).collect(),
        None => items,
    }
}
