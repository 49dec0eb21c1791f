//! # Document Export
//!
//! Converts a finished markdown template into one of the downloadable formats.
//! The format is parsed before any conversion work starts, so an unknown
//! format never touches the renderers.

pub mod docx;
pub mod markdown;
pub mod pdf;
pub mod text;

use crate::errors::ExportError;
use serde::Deserialize;
use std::{fmt, str::FromStr};
use tracing::info;

pub const EXPORT_FILE_STEM: &str = "consulting_template";
pub const DEFAULT_PANDOC_PATH: &str = "pandoc";

/// A supported export target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn filename(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    /// Case-insensitive; `text` is accepted as an alias of `txt`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Text),
            "docx" => Ok(ExportFormat::Docx),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The rendered bytes plus what a client needs to save them.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub filename: String,
}

/// Export settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_pandoc_path")]
    pub pandoc_path: String,
}

fn default_pandoc_path() -> String {
    DEFAULT_PANDOC_PATH.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pandoc_path: default_pandoc_path(),
        }
    }
}

/// Dispatches a template to the renderer for the requested format.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Renders `template` (markdown) as `format`.
    pub async fn export(
        &self,
        template: &str,
        format: &str,
    ) -> Result<ExportedDocument, ExportError> {
        let format: ExportFormat = format.parse()?;
        info!(%format, template_len = template.len(), "Exporting template");

        let bytes = match format {
            ExportFormat::Text => text::strip_tags(&markdown::to_html(template)).into_bytes(),
            ExportFormat::Docx => docx::render_docx(&self.config.pandoc_path, template).await?,
            ExportFormat::Pdf => {
                let html = markdown::to_html(template);
                tokio::task::spawn_blocking(move || pdf::render_pdf(&html)).await??
            }
        };

        Ok(ExportedDocument {
            bytes,
            media_type: format.media_type(),
            filename: format.filename(),
        })
    }
}
