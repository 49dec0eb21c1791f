//! # Application Configuration
//!
//! This module defines the configuration structure for the `consultkit-server`
//! and the logic for loading it in layers: programmatic defaults, `config.yml`,
//! optional `prompt.yml` overrides, and finally environment variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use consultkit::{
    providers::factory::{ProviderConfig, ProviderKind, DEFAULT_MODEL_NAME},
    ExportConfig, PromptTemplates,
};
use regex::Regex;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

/// The variable consulted for the Gemini key when no layer provided one.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// A custom error type for configuration issues.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    #[error("Configuration error: {0}")]
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    #[error("{0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The model provider used for generation and refinement.
    pub model: ProviderConfig,
    /// Settings for the document exporters.
    #[serde(default)]
    pub export: ExportConfig,
    /// Prompt templates; any field left out keeps the library default.
    #[serde(default)]
    pub prompts: PromptTemplates,
}

/// Provides a default value for the `port` field if not set in the environment.
fn default_port() -> u16 {
    9090
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::General(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - With `config_path_override`, that file must exist. Without it,
///   `config.yml` in the crate directory is used when present.
/// - `prompt.yml` next to the main config file overrides prompt templates.
/// - Top-level keys like `port` are overridden by `PORT`.
/// - Nested keys are overridden by `CONSULTKIT_...` variables
///   (e.g., `CONSULTKIT_MODEL__MODEL_NAME`).
/// - If the Gemini key is still blank, `GEMINI_API_KEY` is used.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults.
        .set_default("port", i64::from(default_port()))?
        .set_default("model.provider", "gemini")?
        .set_default("model.model_name", DEFAULT_MODEL_NAME)?
        .set_default("export.pandoc_path", consultkit::export::DEFAULT_PANDOC_PATH)?;

    // Layer 2: Main config.
    let main_config_path = match config_path_override {
        Some(path) => PathBuf::from(path),
        None => base_path.join("config.yml"),
    };
    match read_and_substitute(&main_config_path)? {
        Some(content) => {
            info!(
                "Loading configuration from '{}'.",
                main_config_path.display()
            );
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None if config_path_override.is_some() => {
            return Err(ConfigError::NotFound(format!(
                "Config file not found at '{}'.",
                main_config_path.display()
            )));
        }
        None => info!(
            "'{}' not found. Using defaults and environment only.",
            main_config_path.display()
        ),
    }

    // Layer 3: User prompt overrides (optional), next to the main config.
    let prompt_dir = main_config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(base_path);
    let user_prompt_path = prompt_dir.join("prompt.yml");
    if let Some(user_prompts_content) = read_and_substitute(&user_prompt_path)? {
        info!(
            "Loading user prompt overrides from '{}'.",
            user_prompt_path.display()
        );
        builder = builder.add_source(File::from_str(&user_prompts_content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 4: Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 5: Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("CONSULTKIT")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    // Deserialize the fully resolved configuration into our `AppConfig` struct.
    let mut config: AppConfig = settings.try_deserialize()?;

    // After all layers, fall back to GEMINI_API_KEY if the key is still blank.
    let key_missing = config
        .model
        .api_key
        .as_deref()
        .is_none_or(|key| key.trim().is_empty());
    if config.model.provider == ProviderKind::Gemini && key_missing {
        match env::var(GEMINI_API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => config.model.api_key = Some(key),
            _ => warn!("No Gemini API key configured; set {GEMINI_API_KEY_VAR}."),
        }
    }

    Ok(config)
}
