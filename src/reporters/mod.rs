//! Output reporters for deviation analyses
//!
//! Supports multiple output formats:
//! - `text` - Terminal report, styled when stdout is a terminal
//! - `json` - Flat `deviation_analysis.json` records, reloadable with `show`
//! - `markdown` - GitHub-flavored Markdown

mod json;
mod markdown;
mod text;

use crate::analysis::{rank, DeviationRanking, RankOptions, Ranked};
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Default number of entries in the ranked listing
pub const DEFAULT_TOP: usize = 50;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Analyses plus their ranking, ready to render
#[derive(Debug)]
pub struct DeviationReport<'a, T> {
    /// Every analyzed mention, in input order
    pub analyses: &'a [T],
    pub ranking: DeviationRanking<'a, T>,
    /// How many high-surprisal entries the listing shows
    pub top: usize,
}

impl<'a, T: Ranked> DeviationReport<'a, T> {
    pub fn new(analyses: &'a [T], options: &RankOptions, top: usize) -> Self {
        Self {
            analyses,
            ranking: rank(analyses, options),
            top,
        }
    }

    /// Order the per-character breakdown, usually by the formula database
    pub fn with_character_order<'o>(mut self, order: impl IntoIterator<Item = &'o str>) -> Self {
        self.ranking.order_characters(order);
        self
    }

    /// High-surprisal entries that make it into the listing
    pub fn listed(&self) -> &[&'a T] {
        let n = self.top.min(self.ranking.high_surprisal.len());
        &self.ranking.high_surprisal[..n]
    }
}

/// Render a report in the specified format
pub fn report<T: Ranked>(report: &DeviationReport<'_, T>, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt)
}

/// Render a report using an OutputFormat enum
pub fn report_with_format<T: Ranked>(report: &DeviationReport<'_, T>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    }
}
