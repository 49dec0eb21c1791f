//! # Consulting Pipeline
//!
//! Orchestrates a request end to end: build the prompt, call the model, and
//! either relay the streamed text or turn the answer into a chart.

use crate::{
    chart::render_bar_chart,
    errors::PipelineError,
    extract::extract_series,
    prompts::PromptTemplates,
    providers::{ai::AiProvider, factory::DEFAULT_MODEL_NAME},
    providers::ai::TextStream,
    types::{GenerateTemplateRequest, RefineTemplateRequest, RefinementMode},
};
use std::fmt;
use tracing::{debug, info};

/// What a refinement produced.
pub enum RefinementOutput {
    /// Free-form refinement: the model's text, fragment by fragment.
    Stream(TextStream),
    /// Graph visualization: an encoded PNG bar chart.
    Chart(Vec<u8>),
}

impl fmt::Debug for RefinementOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefinementOutput::Stream(_) => f.write_str("Stream(..)"),
            RefinementOutput::Chart(png) => write!(f, "Chart({} bytes)", png.len()),
        }
    }
}

/// The request pipeline. Cheap to clone; holds no per-request state.
#[derive(Debug, Clone)]
pub struct ConsultingPipeline {
    ai_provider: Box<dyn AiProvider>,
    model: String,
    prompts: PromptTemplates,
}

/// A builder for [`ConsultingPipeline`].
#[derive(Default)]
pub struct ConsultingPipelineBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    model: Option<String>,
    prompts: Option<PromptTemplates>,
}

impl ConsultingPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model client. Required.
    pub fn ai_provider(mut self, ai_provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(ai_provider);
        self
    }

    /// Sets the model identifier sent with every call.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Replaces the built-in prompt templates.
    pub fn prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = Some(prompts);
        self
    }

    pub fn build(self) -> Result<ConsultingPipeline, PipelineError> {
        let ai_provider = self.ai_provider.ok_or_else(|| {
            PipelineError::InvalidRequest("an AI provider is required".to_string())
        })?;
        Ok(ConsultingPipeline {
            ai_provider,
            model: self
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            prompts: self.prompts.unwrap_or_default(),
        })
    }
}

impl ConsultingPipeline {
    pub fn builder() -> ConsultingPipelineBuilder {
        ConsultingPipelineBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Drafts a new template, streamed as the model writes it.
    pub async fn generate(
        &self,
        request: &GenerateTemplateRequest,
    ) -> Result<TextStream, PipelineError> {
        info!(
            company = %request.company_name,
            task = %request.task_or_domain,
            "Generating consulting template"
        );
        let prompt = self
            .prompts
            .initial_generation(&request.company_name, &request.task_or_domain);
        debug!(%prompt, "--> Sending initial generation prompt");
        Ok(self
            .ai_provider
            .generate_stream(&self.model, &prompt, true)
            .await?)
    }

    /// Refines a template according to the request's mode.
    pub async fn refine(
        &self,
        request: &RefineTemplateRequest,
    ) -> Result<RefinementOutput, PipelineError> {
        match request.mode()? {
            RefinementMode::FreeForm {
                option,
                instruction,
            } => {
                info!(option, "Refining template");
                let prompt = self
                    .prompts
                    .refinement(&request.template, option, instruction);
                debug!(%prompt, "--> Sending refinement prompt");
                let stream = self
                    .ai_provider
                    .generate_stream(&self.model, &prompt, true)
                    .await?;
                Ok(RefinementOutput::Stream(stream))
            }
            RefinementMode::GraphVisualization { subject } => {
                info!(subject, "Generating graph visualization");
                self.visualize(&request.template, subject)
                    .await
                    .map(RefinementOutput::Chart)
            }
        }
    }

    /// Asks the model for a year/value series about `subject` and charts it.
    pub async fn visualize(&self, template: &str, subject: &str) -> Result<Vec<u8>, PipelineError> {
        let prompt = self.prompts.graph_data(template, subject);
        debug!(%prompt, "--> Sending graph data prompt");
        let raw = self.ai_provider.generate(&self.model, &prompt, true).await?;
        debug!(raw = %raw, "<-- Graph data from AI");

        let series = extract_series(&raw)?;
        info!(points = series.len(), "Extracted series for chart");

        let png = tokio::task::spawn_blocking(move || render_bar_chart(&series)).await??;
        Ok(png)
    }
}
