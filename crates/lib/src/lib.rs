//! # Consulting Template Generation
//!
//! This crate drafts consulting documents with a generative model that can
//! search the web, refines them (free-form or as a bar chart of model-supplied
//! data), and exports them to plain text, DOCX, or PDF.

pub mod chart;
pub mod errors;
pub mod export;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod types;

pub use errors::{ChartError, ExportError, ExtractionError, PipelineError, ProviderError};
pub use export::{ExportConfig, ExportFormat, ExportedDocument, Exporter};
pub use pipeline::{ConsultingPipeline, ConsultingPipelineBuilder, RefinementOutput};
pub use prompts::PromptTemplates;
pub use types::{
    ExportTemplateRequest, GenerateTemplateRequest, RefineTemplateRequest, Series,
    GRAPH_VISUALIZATION_OPTION,
};
