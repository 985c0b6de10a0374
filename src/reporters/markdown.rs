//! Markdown reporter for GitHub-flavored Markdown output

use super::DeviationReport;
use crate::analysis::Ranked;
use crate::models::Classification;
use anyhow::Result;
use chrono::Local;

/// Render report as GitHub-flavored Markdown
pub fn render<T: Ranked>(report: &DeviationReport<'_, T>) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header());
    md.push('\n');
    md.push_str(&render_summary(report));
    md.push('\n');
    md.push_str(&render_ranked(report));
    md.push('\n');
    md.push_str(&render_characters(report));

    Ok(md)
}

fn render_header() -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("# Formula Deviation Analysis\n\nGenerated: {}\n", timestamp)
}

fn render_summary<T: Ranked>(report: &DeviationReport<'_, T>) -> String {
    let s = &report.ranking.summary;
    let mut md = String::from("## Summary\n\n| Metric | Count | Share |\n|--------|------:|------:|\n");
    md.push_str(&format!("| Mentions analyzed | {} | 100.0% |\n", s.total));
    md.push_str(&format!("| Formulaic | {} | {:.1}% |\n", s.formulaic, s.percent(s.formulaic)));
    md.push_str(&format!("| Bare (no formula) | {} | {:.1}% |\n", s.bare, s.percent(s.bare)));
    md.push_str(&format!(
        "| Deviations | {} | {:.1}% |\n",
        s.deviations,
        s.percent(s.deviations)
    ));
    md
}

fn render_ranked<T: Ranked>(report: &DeviationReport<'_, T>) -> String {
    let listed = report.listed();
    let mut md = format!(
        "## High Surprisal Moments\n\nTop {} of {} mentions above {:.2} bits.\n\n",
        listed.len(),
        report.ranking.high_surprisal.len(),
        report.ranking.threshold
    );
    if listed.is_empty() {
        md.push_str("_No mentions above the threshold._\n");
        return md;
    }

    md.push_str("| # | Line | Character | Surprisal (bits) | Probability | Formula | Deviation | Text |\n");
    md.push_str("|--:|-----:|-----------|-----------------:|------------:|---------|:---------:|------|\n");
    for (i, entry) in listed.iter().enumerate() {
        let formula = match entry.classification() {
            Classification::BareMention => "_bare_".to_string(),
            Classification::Formulaic => match entry.primary_record() {
                Some(record) => format!("`{}` ({})", escape_cell(&record.original), record.formula_type),
                None => entry
                    .primary_formula()
                    .map(|f| format!("`{}`", escape_cell(f)))
                    .unwrap_or_default(),
            },
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {:.2}% | {} | {} | `{}` |\n",
            i + 1,
            entry.line_num(),
            entry.character(),
            entry.surprisal(),
            entry.probability() * 100.0,
            formula,
            if entry.is_deviation() { "yes" } else { "" },
            escape_cell(entry.line())
        ));
    }
    md
}

fn render_characters<T: Ranked>(report: &DeviationReport<'_, T>) -> String {
    let mut md = String::from("## Deviations by Character\n\n");
    for group in &report.ranking.characters {
        md.push_str(&format!(
            "### {}\n\n- Mentions: {}\n- Deviations: {} ({:.1}%)\n",
            group.character,
            group.total,
            group.deviations,
            group.deviation_rate()
        ));
        for entry in &group.most_surprising {
            md.push_str(&format!(
                "  - Line {}: surprisal {}\n",
                entry.line_num(),
                entry.surprisal()
            ));
        }
        md.push('\n');
    }
    md
}

/// Beta Code marks iota subscript with `|`, which would split a table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
