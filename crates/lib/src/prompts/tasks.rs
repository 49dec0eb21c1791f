//! # Default Task Prompts
//!
//! The hardcoded prompt templates for the three consulting tasks. They can be
//! overridden by `config.yml` or `prompt.yml` in the server.
//!
//! Placeholders are written as `{name}` and substituted in a single pass by
//! [`super::core::render_template`].

// --- Initial Generation ---

/// Drafts a fresh consulting template.
///
/// Placeholders: `{company_name}`, `{task_or_domain}`
pub const INITIAL_GENERATION_PROMPT: &str = r#"You are an expert consultant with access to a search tool. Use your search tool to gather the most recent, relevant, and accurate information for the following task.
Create a consulting template for a company.
Company Name: {company_name}
Task/Domain: {task_or_domain}
The template should include:
1. Introduction
2. Pitch Deck (with 3-5 bullet points)
3. General Company Details (industry, size, etc.)
4. Key Recommendations for the task/domain
Use your search tool to ensure all details are current, relevant, and real time.
At the end, include a 'References' section listing all sources/links used, formatted in Harvard referencing style.
Format the response in markdown with clear section headers."#;

// --- Free-form Refinement ---

/// Rewrites an existing template following a user instruction.
///
/// Placeholders: `{template}`, `{refinement_option}`, `{refinement_prompt}`
pub const REFINEMENT_PROMPT: &str = r#"You are an expert consultant with access to a search tool. Use your search tool to gather up-to-date, relevant, and accurate information for the following refinement.
Here is a consulting template:
{template}

Please {refinement_option} as follows:
{refinement_prompt}
Use your search tool to ensure all details are current and relevant.
At the end, include a 'References' section listing all sources/links used, formatted in Harvard referencing style.
Return the updated template in markdown."#;

// --- Graph Data Refinement ---

/// Asks for chartable year/value data and nothing else.
///
/// Placeholders: `{template}`, `{visualize_data}`
pub const GRAPH_DATA_PROMPT: &str = r#"You are an expert consultant with access to a search tool. Use your search tool to gather up-to-date, relevant, and accurate information for the following refinement.
Here is a consulting template:
{template}

Now provide the data for the X axis and Y axis of a graph visualization as a dictionary of key value pairs and NOTHING ELSE.
Visualization data for: {visualize_data}
Use your search tool to ensure all details are current and relevant.
Provide at least 3 data points, and as many more as you are able to find, but make sure the data is relevant to the company and the task/domain only.
The key must be the year and the value must be the data for that year. Years must be in ascending order. Both the key and the value must be numbers.
Format the answer as a dictionary of key value pairs, for example {2021: 10.5, 2022: 12.0, 2023: 14.2}.
Strictly respond with only the dictionary and nothing else."#;
