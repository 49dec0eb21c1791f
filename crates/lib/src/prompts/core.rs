//! # Prompt Builders
//!
//! Pure functions that turn request data into complete prompt strings. None of
//! them perform I/O or call a model.

use super::tasks::{GRAPH_DATA_PROMPT, INITIAL_GENERATION_PROMPT, REFINEMENT_PROMPT};
use serde::{Deserialize, Serialize};

/// The set of templates the pipeline builds prompts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub initial_generation: String,
    pub refinement: String,
    pub graph_data: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            initial_generation: INITIAL_GENERATION_PROMPT.to_string(),
            refinement: REFINEMENT_PROMPT.to_string(),
            graph_data: GRAPH_DATA_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Builds the prompt that drafts a new consulting template.
    pub fn initial_generation(&self, company_name: &str, task_or_domain: &str) -> String {
        render_template(
            &self.initial_generation,
            &[
                ("company_name", company_name),
                ("task_or_domain", task_or_domain),
            ],
        )
    }

    /// Builds the free-form refinement prompt.
    ///
    /// The option label is lower-cased so "Expand Section" reads as
    /// "Please expand section as follows". A missing instruction yields an
    /// empty detail line rather than an error.
    pub fn refinement(
        &self,
        template: &str,
        refinement_option: &str,
        refinement_prompt: Option<&str>,
    ) -> String {
        let option = refinement_option.to_lowercase();
        render_template(
            &self.refinement,
            &[
                ("template", template),
                ("refinement_option", &option),
                ("refinement_prompt", refinement_prompt.unwrap_or_default()),
            ],
        )
    }

    /// Builds the prompt asking for chartable year/value data.
    pub fn graph_data(&self, template: &str, visualize_data: &str) -> String {
        render_template(
            &self.graph_data,
            &[("template", template), ("visualize_data", visualize_data)],
        )
    }
}

/// Substitutes `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so a document that happens to
/// contain `{template}` is embedded verbatim. Braces that do not name a known
/// placeholder are kept as written.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let rendered = render_template("{a} and {b} and {2020: 5}", &[("a", "x")]);
        assert_eq!(rendered, "x and {b} and {2020: 5}");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let rendered = render_template("{template}|{option}", &[
            ("template", "doc mentions {option}"),
            ("option", "expand"),
        ]);
        assert_eq!(rendered, "doc mentions {option}|expand");
    }

    #[test]
    fn unterminated_brace_is_kept() {
        assert_eq!(render_template("tail {open", &[("open", "x")]), "tail {open");
    }
}
