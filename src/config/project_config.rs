//! Project-level configuration support
//!
//! Loads configuration from `formulaic.toml` or `.formulaicrc.json` in the
//! working directory, falling back to `~/.config/formulaic/config.toml`.
//!
//! # Configuration Format
//!
//! ```toml
//! # formulaic.toml
//!
//! [inputs]
//! formulae = "formulae_database.json"
//! mentions = "homer_analysis.json"
//! strict = false
//!
//! [ranking]
//! high_surprisal_threshold = 3.0
//! top = 50
//! per_character_top = 3
//!
//! [output]
//! format = "text"
//! # path = "deviation_report.txt"
//! ```

use crate::analysis::{DEFAULT_HIGH_SURPRISAL_THRESHOLD, DEFAULT_PER_CHARACTER_TOP};
use crate::reporters::{OutputFormat, DEFAULT_TOP};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// File name of the project config
pub const CONFIG_FILE_NAME: &str = "formulaic.toml";

/// Commented default config written by `formulaic init`
pub const DEFAULT_CONFIG_TOML: &str = r#"# formulaic configuration
# CLI flags override anything set here.

[inputs]
# Confirmed-formula database produced by formula review
formulae = "formulae_database.json"

# Character mentions produced by line extraction
mentions = "homer_analysis.json"

# Abort on malformed records instead of skipping them
strict = false

[ranking]
# Mentions above this many bits are listed as high surprisal
high_surprisal_threshold = 3.0

# Entries shown in the ranked listing
top = 50

# Most surprising mentions shown per character
per_character_top = 3

[output]
# Default output format (text, json, markdown)
format = "text"

# Write the report here instead of stdout
# path = "deviation_report.txt"
"#;

/// Input file locations and record policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    pub formulae: PathBuf,
    pub mentions: PathBuf,
    pub strict: bool,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            formulae: PathBuf::from("formulae_database.json"),
            mentions: PathBuf::from("homer_analysis.json"),
            strict: false,
        }
    }
}

/// Ranking and listing sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub high_surprisal_threshold: f64,
    pub top: usize,
    pub per_character_top: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            high_surprisal_threshold: DEFAULT_HIGH_SURPRISAL_THRESHOLD,
            top: DEFAULT_TOP,
            per_character_top: DEFAULT_PER_CHARACTER_TOP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            path: None,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub inputs: InputsConfig,
    pub ranking: RankingConfig,
    pub output: OutputConfig,
}

impl ProjectConfig {
    /// Reject values the pipeline cannot use
    pub fn validate(&self) -> Result<()> {
        let threshold = self.ranking.high_surprisal_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            bail!(
                "ranking.high_surprisal_threshold must be a non-negative number, got {}",
                threshold
            );
        }
        OutputFormat::from_str(&self.output.format)?;
        Ok(())
    }
}

/// Load config for `dir`, trying TOML, then JSON, then the user config.
///
/// Files that fail to parse are logged and skipped; with nothing usable the
/// defaults are returned.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    let toml_path = dir.join(CONFIG_FILE_NAME);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(".formulaicrc.json");
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    if let Some(user_path) = user_config_path().filter(|p| p.exists()) {
        match load_toml_config(&user_path) {
            Ok(config) => {
                debug!("Loaded user config from {}", user_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", user_path.display(), e);
            }
        }
    }

    debug!("No config found, using defaults");
    ProjectConfig::default()
}

/// Get the user config file path
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("formulaic").join("config.toml"))
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}
