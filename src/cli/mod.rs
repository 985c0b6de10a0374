//! CLI command definitions and handlers

mod analyze;
mod init;
mod output;
mod profile;
mod show;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a non-negative, finite bit threshold
fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !value.is_finite() || value < 0.0 {
        Err("threshold must be a non-negative number of bits".to_string())
    } else {
        Ok(value)
    }
}

/// Formulaic - formula deviation detection for the Iliad
#[derive(Parser, Debug)]
#[command(name = "formulaic")]
#[command(
    version,
    about = "Find character mentions that break their usual epithet and formula patterns",
    long_about = "Formulaic indexes each character's confirmed formulae, learns how often \
each one accompanies a mention, and scores every mention by its surprisal \
(-log2 probability). Rare formulae and bare names where a formula is expected \
are flagged as deviations.\n\n\
Settings are read from formulaic.toml in the working directory; flags override them.",
    after_help = "\
Examples:
  formulaic analyze                              Analyze with configured inputs
  formulaic analyze --format json -o out.json    Save a reloadable analysis
  formulaic analyze --character Hector           Only Hector's mentions
  formulaic show out.json --threshold 5          Re-rank a saved analysis
  formulaic profile --character Achilles         Achilles' formula rates
  formulaic init                                 Write a default formulaic.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a formulaic.toml config file with default settings
    Init,

    /// Score every mention and rank the deviations
    #[command(after_help = "\
Examples:
  formulaic analyze --formulae db.json --mentions mentions.json
  formulaic analyze --threshold 4 --top 20
  formulaic analyze --deviations-only --fail-on-deviations   Exit 1 if anything deviates")]
    Analyze {
        /// Confirmed-formula database (default from config)
        #[arg(long)]
        formulae: Option<PathBuf>,

        /// Character mentions (default from config)
        #[arg(long)]
        mentions: Option<PathBuf>,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// List mentions above this many bits
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,

        /// Maximum entries in the ranked listing
        #[arg(long)]
        top: Option<usize>,

        /// Most surprising mentions shown per character
        #[arg(long)]
        per_character: Option<usize>,

        /// Fail on malformed records instead of skipping them
        #[arg(long)]
        strict: bool,

        /// Only list mentions flagged as deviations
        #[arg(long)]
        deviations_only: bool,

        /// Restrict the analysis to one character
        #[arg(long)]
        character: Option<String>,

        /// Exit with code 1 if any deviation is found (CI mode)
        #[arg(long)]
        fail_on_deviations: bool,
    },

    /// Re-rank a saved JSON analysis
    Show {
        /// Path to a deviation analysis written with --format json
        analysis: PathBuf,

        /// List mentions above this many bits (default: threshold stored in the file)
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,

        /// Maximum entries in the ranked listing
        #[arg(long)]
        top: Option<usize>,

        /// Most surprising mentions shown per character
        #[arg(long)]
        per_character: Option<usize>,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
        format: Option<String>,

        /// Only list mentions flagged as deviations
        #[arg(long)]
        deviations_only: bool,

        /// Restrict the listing to one character
        #[arg(long)]
        character: Option<String>,
    },

    /// Print per-character formula rates
    Profile {
        /// Confirmed-formula database (default from config)
        #[arg(long)]
        formulae: Option<PathBuf>,

        /// Character mentions (default from config)
        #[arg(long)]
        mentions: Option<PathBuf>,

        /// Only this character
        #[arg(long)]
        character: Option<String>,

        /// Fail on malformed records instead of skipping them
        #[arg(long)]
        strict: bool,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init => init::run(&cwd),

        Commands::Analyze {
            formulae,
            mentions,
            format,
            output,
            threshold,
            top,
            per_character,
            strict,
            deviations_only,
            character,
            fail_on_deviations,
        } => {
            let config = formulaic::config::load_project_config(&cwd);
            config.validate()?;
            let settings = analyze::AnalyzeSettings::resolve(
                &config,
                analyze::AnalyzeFlags {
                    formulae,
                    mentions,
                    format,
                    output,
                    threshold,
                    top,
                    per_character,
                    strict,
                    deviations_only,
                    character,
                },
            )?;
            analyze::run(&settings, fail_on_deviations)
        }

        Commands::Show {
            analysis,
            threshold,
            top,
            per_character,
            format,
            deviations_only,
            character,
        } => {
            let config = formulaic::config::load_project_config(&cwd);
            config.validate()?;
            show::run(
                &config,
                &analysis,
                show::ShowFlags {
                    threshold,
                    top,
                    per_character,
                    format,
                    deviations_only,
                    character,
                },
            )
        }

        Commands::Profile {
            formulae,
            mentions,
            character,
            strict,
            format,
        } => {
            let config = formulaic::config::load_project_config(&cwd);
            config.validate()?;
            let strictness = formulaic::corpus::Strictness::from_flag(strict || config.inputs.strict);
            let formulae = formulae.unwrap_or(config.inputs.formulae);
            let mentions = mentions.unwrap_or(config.inputs.mentions);
            profile::run(
                &formulae,
                &mentions,
                strictness,
                character.as_deref(),
                &format,
            )
        }
    }
}
