use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};

/// The `refinement_option` value that switches a refinement to chart generation.
pub const GRAPH_VISUALIZATION_OPTION: &str = "Graph Visualization";

/// Input for drafting a new consulting template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTemplateRequest {
    pub company_name: String,
    pub task_or_domain: String,
}

/// Input for refining an existing template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefineTemplateRequest {
    pub template: String,
    pub refinement_option: String,
    #[serde(default)]
    pub refinement_prompt: Option<String>,
    #[serde(default)]
    pub visualize_data: Option<String>,
}

/// Input for exporting a finished template.
///
/// `company_name` and `task_or_domain` are accepted for API compatibility but
/// do not influence the rendered output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTemplateRequest {
    pub template: String,
    pub format: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub task_or_domain: String,
}

/// What a refinement request asks the pipeline to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinementMode<'a> {
    FreeForm {
        option: &'a str,
        instruction: Option<&'a str>,
    },
    GraphVisualization {
        subject: &'a str,
    },
}

impl RefineTemplateRequest {
    /// Resolves the request into a refinement mode.
    ///
    /// Graph visualization requires a non-blank `visualize_data`; free-form
    /// refinement tolerates a missing instruction.
    pub fn mode(&self) -> Result<RefinementMode<'_>, PipelineError> {
        if self.refinement_option == GRAPH_VISUALIZATION_OPTION {
            let subject = self
                .visualize_data
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    PipelineError::InvalidRequest(
                        "visualize_data is required for Graph Visualization".to_string(),
                    )
                })?;
            Ok(RefinementMode::GraphVisualization { subject })
        } else {
            Ok(RefinementMode::FreeForm {
                option: &self.refinement_option,
                instruction: self.refinement_prompt.as_deref(),
            })
        }
    }
}

/// One bar of a chart: a numeric key (nominally a year) and its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub key: f64,
    pub value: f64,
}

/// An ordered year→value series extracted from model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: Vec<DataPoint>,
}

impl Series {
    pub fn new(points: Vec<DataPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(f64, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(key, value)| DataPoint { key, value })
                .collect(),
        )
    }
}

/// Formats a key for display: integral keys such as years print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
