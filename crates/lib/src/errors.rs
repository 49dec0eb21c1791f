use thiserror::Error;

/// Errors raised while talking to a generative-model provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(String),
    #[error("AI provider returned status {status}: {body}")]
    AiApi { status: u16, body: String },
    #[error("AI provider stream failed: {0}")]
    Stream(String),
    #[error("AI provider is misconfigured: {0}")]
    Misconfigured(String),
}

/// Reasons a series could not be pulled out of model output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("no brace-delimited mapping found in model output")]
    NoMapping,
    #[error("unbalanced braces starting at byte {0}")]
    Unbalanced(usize),
    #[error("malformed literal at byte {position}: {message}")]
    Malformed { position: usize, message: String },
    #[error("literal is not a mapping")]
    NotAMapping,
    #[error("entry {index} is not numeric: {entry}")]
    NonNumeric { index: usize, entry: String },
    #[error("keys are not strictly ascending at entry {index}")]
    NotAscending { index: usize },
    #[error("series has {found} entries, at least {required} are required")]
    TooFewEntries { found: usize, required: usize },
}

/// Errors raised while rendering a series to an image.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("cannot render an empty series")]
    EmptySeries,
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors raised by the export renderers.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: '{0}'")]
    UnsupportedFormat(String),
    #[error("{tool} could not be started: {source}")]
    ConverterUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} failed with {status}: {stderr}")]
    ConversionFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
    #[error("I/O error during export: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors surfaced by the consulting pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Failed to extract data for graph visualization: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Failed to render chart: {0}")]
    Chart(#[from] ChartError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Chart rendering task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
