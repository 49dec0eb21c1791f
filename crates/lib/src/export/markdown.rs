//! Markdown to HTML conversion shared by the text and PDF renderers.

use pulldown_cmark::{html, Options, Parser};

/// Converts a markdown document to an HTML fragment.
///
/// Tables, strikethrough, task lists and footnotes are recognised on top of
/// CommonMark (which already covers fenced code blocks).
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
