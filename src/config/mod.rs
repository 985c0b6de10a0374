//! Configuration module for formulaic
//!
//! This module handles:
//! - Project-level configuration (formulaic.toml)
//! - User-level fallback (~/.config/formulaic/config.toml)
//! - CLI defaults for inputs, ranking and output

mod project_config;

pub use project_config::{
    load_project_config, user_config_path, InputsConfig, OutputConfig, ProjectConfig, RankingConfig,
    CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML,
};
