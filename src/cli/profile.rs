//! Profile command - per-character formula rates

use anyhow::{bail, Context, Result};
use console::style;
use formulaic::analysis::{ExpectationModel, ExpectationProfile, PatternIndex};
use formulaic::corpus::{load_formula_database, load_mentions, Strictness};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// JSON view of one profile, with the derived bare-mention figures
#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    total_mentions: u32,
    formula_counts: &'a BTreeMap<String, u32>,
    formula_probabilities: &'a BTreeMap<String, f64>,
    bare_count: u32,
    bare_probability: f64,
}

impl<'a> From<&'a ExpectationProfile> for ProfileView<'a> {
    fn from(profile: &'a ExpectationProfile) -> Self {
        Self {
            total_mentions: profile.total_mentions,
            formula_counts: &profile.formula_counts,
            formula_probabilities: &profile.formula_probabilities,
            bare_count: profile.bare_count(),
            bare_probability: profile.bare_probability(),
        }
    }
}

/// Run the profile command
pub(super) fn run(
    formulae: &Path,
    mentions: &Path,
    strictness: Strictness,
    character: Option<&str>,
    format: &str,
) -> Result<()> {
    let database =
        load_formula_database(formulae, strictness).with_context(|| "Failed to load formula database")?;
    let mentions = load_mentions(mentions, strictness).with_context(|| "Failed to load mentions")?;

    let index = PatternIndex::build(&database);
    let model = ExpectationModel::build(&mentions, &index);

    let selected: Vec<(&str, &ExpectationProfile)> = match character {
        Some(name) => match model.profile(name) {
            Some(profile) => vec![(name, profile)],
            None => bail!("No profile for '{}': character is not in the formula database", name),
        },
        None => model.iter().collect(),
    };

    let output = if format == "json" {
        // Database order
        let views: IndexMap<&str, ProfileView<'_>> =
            selected.into_iter().map(|(name, p)| (name, ProfileView::from(p))).collect();
        serde_json::to_string_pretty(&views)?
    } else {
        render_text(&selected)?
    };
    println!("{}", output);
    Ok(())
}

fn render_text(profiles: &[(&str, &ExpectationProfile)]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "\n{}", style("Expectation Profiles").bold())?;

    for (name, profile) in profiles {
        writeln!(
            out,
            "\n  {} ({} mentions)",
            style(name).cyan().bold(),
            profile.total_mentions
        )?;
        if profile.formula_counts.is_empty() {
            writeln!(out, "    {}", style("no formulae observed").dim())?;
        }

        // Most frequent first; BTreeMap order breaks ties
        let mut counts: Vec<(&String, &u32)> = profile.formula_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (pattern, count) in counts {
            writeln!(
                out,
                "    {:<32} {:>5}  {:>6.2}%",
                pattern,
                count,
                profile.probability_of(pattern) * 100.0
            )?;
        }
        writeln!(
            out,
            "    {:<32} {:>5}  {:>6.2}%",
            style("(bare)").dim(),
            profile.bare_count(),
            profile.bare_probability() * 100.0
        )?;
    }
    Ok(out)
}
