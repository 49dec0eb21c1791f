//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The model client is created once here and
//! injected into the pipeline shared by all request handlers.

use crate::config::AppConfig;
use consultkit::{
    providers::{ai::AiProvider, factory::create_provider},
    ConsultingPipeline, Exporter,
};
use std::sync::Arc;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Generation and refinement.
    pub pipeline: Arc<ConsultingPipeline>,
    /// Document export.
    pub exporter: Arc<Exporter>,
}

/// Builds the shared application state from the configuration.
///
/// A misconfigured provider (e.g. Gemini without an API key) fails here, so
/// the server refuses to start rather than failing every request.
pub fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let ai_provider = create_provider(&config.model)?;
    build_app_state_with_provider(config, ai_provider)
}

/// Builds the application state around an already constructed provider.
pub fn build_app_state_with_provider(
    config: AppConfig,
    ai_provider: Box<dyn AiProvider>,
) -> anyhow::Result<AppState> {
    info!(
        provider = ?config.model.provider,
        model = %config.model.model_name,
        "Building application state"
    );
    let pipeline = ConsultingPipeline::builder()
        .ai_provider(ai_provider)
        .model(config.model.model_name.clone())
        .prompts(config.prompts)
        .build()?;
    let exporter = Exporter::new(config.export);

    Ok(AppState {
        pipeline: Arc::new(pipeline),
        exporter: Arc::new(exporter),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use consultkit::providers::factory::ProviderConfig;
    use consultkit_test_utils::MockAiProvider;

    #[test]
    fn state_carries_the_configured_model() {
        let config = AppConfig {
            port: 0,
            model: ProviderConfig {
                model_name: "gemini-custom".to_string(),
                ..Default::default()
            },
            export: Default::default(),
            prompts: Default::default(),
        };
        let state =
            build_app_state_with_provider(config, Box::new(MockAiProvider::new())).unwrap();
        assert_eq!(state.pipeline.model(), "gemini-custom");
    }
}
