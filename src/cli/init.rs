//! Init command - write a default formulaic.toml

use anyhow::{Context, Result};
use console::style;
use formulaic::config::{CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML};
use std::path::Path;

/// Run the init command
pub(super) fn run(dir: &Path) -> Result<()> {
    println!("\n{} Initializing formulaic\n", style("::").bold());

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to create {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );

    println!("\n{}", style("Next steps:").bold());
    println!("  1. Point [inputs] at your formula database and mentions");
    println!("  2. Run {}", style("formulaic analyze").cyan());
    Ok(())
}
