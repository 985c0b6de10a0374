//! Analyze command - run the full pipeline and report

use super::output::{emit, filter_character};
use anyhow::{Context, Result};
use formulaic::analysis::{self, RankOptions};
use formulaic::config::ProjectConfig;
use formulaic::corpus::{load_formula_database, load_mentions, Strictness};
use formulaic::reporters::OutputFormat;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Flags as given on the command line
#[derive(Debug, Default)]
pub(super) struct AnalyzeFlags {
    pub formulae: Option<PathBuf>,
    pub mentions: Option<PathBuf>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub top: Option<usize>,
    pub per_character: Option<usize>,
    pub strict: bool,
    pub deviations_only: bool,
    pub character: Option<String>,
}

/// Flags merged over the project config
#[derive(Debug, Clone, PartialEq)]
pub(super) struct AnalyzeSettings {
    pub formulae: PathBuf,
    pub mentions: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub strictness: Strictness,
    pub rank: RankOptions,
    pub top: usize,
    pub character: Option<String>,
}

impl AnalyzeSettings {
    pub fn resolve(config: &ProjectConfig, flags: AnalyzeFlags) -> Result<Self> {
        let format = flags.format.as_deref().unwrap_or(&config.output.format);
        Ok(Self {
            formulae: flags.formulae.unwrap_or_else(|| config.inputs.formulae.clone()),
            mentions: flags.mentions.unwrap_or_else(|| config.inputs.mentions.clone()),
            format: OutputFormat::from_str(format)?,
            output: flags.output.or_else(|| config.output.path.clone()),
            strictness: Strictness::from_flag(flags.strict || config.inputs.strict),
            rank: RankOptions {
                threshold: flags.threshold.unwrap_or(config.ranking.high_surprisal_threshold),
                per_character_top: flags.per_character.unwrap_or(config.ranking.per_character_top),
                deviations_only: flags.deviations_only,
            },
            top: flags.top.unwrap_or(config.ranking.top),
            character: flags.character,
        })
    }
}

/// Run the analyze command
pub(super) fn run(settings: &AnalyzeSettings, fail_on_deviations: bool) -> Result<()> {
    let database = load_formula_database(&settings.formulae, settings.strictness)
        .with_context(|| "Failed to load formula database")?;
    let mentions = load_mentions(&settings.mentions, settings.strictness)
        .with_context(|| "Failed to load mentions")?;
    info!(
        "Loaded {} characters and {} mentions",
        database.len(),
        mentions.len()
    );

    let run = analysis::analyze(&database, &mentions);
    let analyses = filter_character(run.analyses, settings.character.as_deref());
    if let Some(name) = settings.character.as_deref() {
        if analyses.is_empty() {
            warn!("No analyzed mentions for character '{}'", name);
        }
    }

    let character_order: Vec<&str> = run.index.characters().collect();
    emit(
        &analyses,
        &settings.rank,
        settings.top,
        &character_order,
        settings.format,
        settings.output.as_deref(),
    )?;

    let deviations = analyses.iter().filter(|a| a.is_deviation).count();
    if fail_on_deviations && deviations > 0 {
        eprintln!("Failing due to --fail-on-deviations ({} deviations)", deviations);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = ProjectConfig::default();
        config.ranking.high_surprisal_threshold = 4.0;
        config.ranking.top = 10;
        config.output.format = "json".into();

        let settings = AnalyzeSettings::resolve(
            &config,
            AnalyzeFlags {
                threshold: Some(2.0),
                format: Some("md".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(settings.rank.threshold, 2.0);
        assert_eq!(settings.format, OutputFormat::Markdown);
        assert_eq!(settings.top, 10);
        assert_eq!(settings.mentions, PathBuf::from("homer_analysis.json"));
        assert_eq!(settings.strictness, Strictness::Lenient);
    }

    #[test]
    fn test_strict_from_config_or_flag() {
        let mut config = ProjectConfig::default();
        config.inputs.strict = true;
        let settings = AnalyzeSettings::resolve(&config, AnalyzeFlags::default()).unwrap();
        assert_eq!(settings.strictness, Strictness::Strict);

        let settings = AnalyzeSettings::resolve(
            &ProjectConfig::default(),
            AnalyzeFlags {
                strict: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(settings.strictness, Strictness::Strict);
    }
}
