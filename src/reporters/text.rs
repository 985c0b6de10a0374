//! Text (terminal) reporter
//!
//! Styling goes through `console`, which drops colors automatically when
//! stdout is not a terminal or `--no-color` is set.

use super::DeviationReport;
use crate::analysis::Ranked;
use crate::models::Classification;
use anyhow::Result;
use console::style;
use std::fmt::Write as _;

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Render report as formatted terminal output
pub fn render<T: Ranked>(report: &DeviationReport<'_, T>) -> Result<String> {
    let mut out = String::new();
    let ranking = &report.ranking;
    let summary = &ranking.summary;

    // Header
    writeln!(out, "\n{}", style("Formula Deviation Analysis").bold())?;
    writeln!(out, "{}", style(RULE).dim())?;

    // Overall statistics
    writeln!(out, "{}", style("OVERALL STATISTICS").bold())?;
    writeln!(out, "  Mentions analyzed:  {}", summary.total)?;
    writeln!(
        out,
        "  Formulaic:          {} ({:.1}%)",
        summary.formulaic,
        summary.percent(summary.formulaic)
    )?;
    writeln!(
        out,
        "  Bare (no formula):  {} ({:.1}%)",
        summary.bare,
        summary.percent(summary.bare)
    )?;
    writeln!(
        out,
        "  Deviations:         {} ({:.1}%)\n",
        style(summary.deviations).yellow(),
        summary.percent(summary.deviations)
    )?;

    // Ranked listing
    let listed = report.listed();
    writeln!(
        out,
        "{} (top {} of {}, above {:.2} bits)",
        style("HIGH SURPRISAL MOMENTS").bold(),
        listed.len(),
        ranking.high_surprisal.len(),
        ranking.threshold
    )?;
    if listed.is_empty() {
        writeln!(out, "  {}", style("No mentions above the threshold.").dim())?;
    }

    for (i, entry) in listed.iter().enumerate() {
        let marker = if entry.is_deviation() {
            style("deviation").red().to_string()
        } else {
            style("expected").dim().to_string()
        };
        writeln!(
            out,
            "\n  {:>3}. Line {}: {}  [{}]",
            i + 1,
            entry.line_num(),
            style(entry.character()).cyan(),
            marker
        )?;
        writeln!(out, "       Surprisal:   {} bits", style(entry.surprisal()).bold())?;
        writeln!(out, "       Probability: {:.2}%", entry.probability() * 100.0)?;

        match entry.classification() {
            Classification::BareMention => {
                writeln!(out, "       Type:        bare mention (no formula)")?;
            }
            Classification::Formulaic => {
                if let Some(formula) = entry.primary_formula() {
                    writeln!(out, "       Formula:     {}", formula)?;
                }
                if let Some(record) = entry.primary_record() {
                    writeln!(out, "       Formula type: {} ({})", record.formula_type, record.position)?;
                    if !record.semantic_category.is_empty() {
                        writeln!(out, "       Semantic:    {}", record.semantic_category)?;
                    }
                }
            }
        }

        writeln!(out, "       Line:        {}", entry.line())?;
        if let Some(context) = entry.context() {
            writeln!(out, "       Context:     {}", style(context).dim())?;
        }
    }

    let remaining = ranking.high_surprisal.len().saturating_sub(listed.len());
    if remaining > 0 {
        writeln!(out, "\n  {}", style(format!("...and {} more (use --top)", remaining)).dim())?;
    }

    // Per-character breakdown
    writeln!(out, "\n{}", style(RULE).dim())?;
    writeln!(out, "{}", style("DEVIATIONS BY CHARACTER").bold())?;
    for group in &ranking.characters {
        writeln!(out, "\n  {}", style(group.character).cyan().bold())?;
        writeln!(out, "    Mentions:   {}", group.total)?;
        writeln!(
            out,
            "    Deviations: {} ({:.1}%)",
            group.deviations,
            group.deviation_rate()
        )?;
        if !group.most_surprising.is_empty() {
            writeln!(out, "    Most surprising:")?;
            for entry in &group.most_surprising {
                writeln!(
                    out,
                    "      Line {}: surprisal {}",
                    entry.line_num(),
                    entry.surprisal()
                )?;
            }
        }
    }

    Ok(out)
}
