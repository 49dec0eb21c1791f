//! # AI Provider Factory
//!
//! Builds the process-wide model client from configuration. The server calls
//! this once at startup; a misconfigured provider is fatal there rather than a
//! per-request error.

use crate::{
    errors::ProviderError,
    providers::ai::{
        gemini::{GeminiProvider, DEFAULT_GEMINI_API_BASE},
        local::LocalAiProvider,
        AiProvider,
    },
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// The model that drafts and refines consulting templates unless configured otherwise.
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";

/// Which wire protocol the provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Local,
}

/// Connection settings for the model provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    /// For Gemini, the versioned API root; for local providers, the full
    /// chat-completions URL.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            api_url: None,
            api_key: None,
            model_name: default_model_name(),
        }
    }
}

/// Instantiates the provider described by `config`.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn AiProvider>, ProviderError> {
    let api_url = config.api_url.clone().filter(|url| !url.trim().is_empty());
    let api_key = config.api_key.clone().filter(|key| !key.trim().is_empty());

    let provider: Box<dyn AiProvider> = match config.provider {
        ProviderKind::Gemini => {
            let api_key = api_key.ok_or_else(|| {
                ProviderError::Misconfigured(
                    "an API key is required for the gemini provider (set GEMINI_API_KEY)"
                        .to_string(),
                )
            })?;
            let api_base = api_url.unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());
            info!(%api_base, model = %config.model_name, "Configuring Gemini provider");
            Box::new(GeminiProvider::new(api_base, api_key)?)
        }
        ProviderKind::Local => {
            let api_url = api_url.ok_or_else(|| {
                ProviderError::Misconfigured(
                    "api_url is required for the local provider".to_string(),
                )
            })?;
            info!(%api_url, model = %config.model_name, "Configuring local AI provider");
            Box::new(LocalAiProvider::new(api_url, api_key)?)
        }
    };

    Ok(provider)
}
