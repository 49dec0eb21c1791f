//! PDF rendering.
//!
//! The HTML form of the document is flattened into a list of text blocks
//! (headings, paragraphs, list items, table rows, preformatted text), which are
//! word-wrapped and laid out top to bottom on Letter pages using the built-in
//! Helvetica and Courier fonts.

use crate::errors::ExportError;
use printpdf::{
    BuiltinFont, FontId, Layer, LayerInternalId, Mm, Op, ParsedFont, PdfDocument, PdfPage,
    PdfSaveOptions, Pt, TextItem, TextMatrix, TextRenderingMode,
};
use scraper::{ElementRef, Html, Node};
use tracing::{debug, warn};

const PAGE_WIDTH: Mm = Mm(215.9);
const PAGE_HEIGHT: Mm = Mm(279.4);
const MARGIN: Mm = Mm(20.0);
const PT_PER_MM: f32 = 72.0 / 25.4;

/// One laid-out unit of the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { depth: usize, marker: String, text: String },
    Preformatted(String),
    TableRow(Vec<String>),
    Rule,
}

/// Flattens an HTML fragment into blocks, in document order.
pub fn html_to_blocks(html: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    let mut blocks = Vec::new();
    walk(fragment.root_element(), 0, &mut blocks);
    blocks
}

fn walk(element: ElementRef, list_depth: usize, blocks: &mut Vec<Block>) {
    for child in element.children() {
        let Some(el) = ElementRef::wrap(child) else {
            if let Node::Text(text) = child.value() {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    blocks.push(Block::Paragraph(text));
                }
            }
            continue;
        };
        match el.value().name() {
            name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                let level = name[1..].parse().unwrap_or(6);
                push_text(blocks, inline_text(el), |text| Block::Heading { level, text });
            }
            "p" => push_text(blocks, inline_text(el), Block::Paragraph),
            "pre" => {
                let text: String = el.text().collect();
                blocks.push(Block::Preformatted(text.trim_end_matches('\n').to_string()));
            }
            "ul" | "ol" => list(el, list_depth, blocks),
            "tr" => {
                let cells = el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| matches!(c.value().name(), "td" | "th"))
                    .map(inline_text)
                    .collect();
                blocks.push(Block::TableRow(cells));
            }
            "hr" => blocks.push(Block::Rule),
            "script" | "style" => {}
            _ => walk(el, list_depth, blocks),
        }
    }
}

fn list(el: ElementRef, depth: usize, blocks: &mut Vec<Block>) {
    let ordered = el.value().name() == "ol";
    let start: usize = el
        .value()
        .attr("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let items = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "li");
    for (i, item) in items.enumerate() {
        let marker = if ordered {
            format!("{}.", start + i)
        } else {
            "-".to_string()
        };
        // Text directly in the item; nested lists and paragraphs follow as their own blocks.
        let own_text = collapse_whitespace(
            &item
                .children()
                .filter(|c| {
                    ElementRef::wrap(*c)
                        .map(|e| !matches!(e.value().name(), "ul" | "ol" | "p"))
                        .unwrap_or(true)
                })
                .map(|c| match c.value() {
                    Node::Text(t) => (&**t).to_string(),
                    _ => ElementRef::wrap(c).map(|e| e.text().collect()).unwrap_or_default(),
                })
                .collect::<String>(),
        );
        let paragraphs: Vec<String> = item
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| c.value().name() == "p")
            .map(inline_text)
            .collect();
        let text = std::iter::once(own_text)
            .chain(paragraphs)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        blocks.push(Block::ListItem {
            depth,
            marker,
            text,
        });
        for nested in item
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "ul" | "ol"))
        {
            list(nested, depth + 1, blocks);
        }
    }
}

fn push_text(blocks: &mut Vec<Block>, text: String, make: impl FnOnce(String) -> Block) {
    if !text.is_empty() {
        blocks.push(make(text));
    }
}

fn inline_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap to at most `max_chars` per line; overlong words are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
    Mono,
}

impl Face {
    /// Average glyph width as a fraction of the font size.
    fn width_factor(self) -> f32 {
        match self {
            Face::Regular => 0.5,
            Face::Bold => 0.55,
            Face::Mono => 0.6,
        }
    }
}

struct Fonts {
    regular: FontId,
    bold: FontId,
    mono: FontId,
}

impl Fonts {
    fn load(doc: &mut PdfDocument) -> Result<Self, ExportError> {
        let mut add = |builtin: BuiltinFont| -> Result<FontId, ExportError> {
            let bytes = builtin.get_subset_font().bytes;
            let font = ParsedFont::from_bytes(&bytes, 0, &mut Vec::new())
                .ok_or_else(|| ExportError::Pdf("failed to parse built-in font".to_string()))?;
            Ok(doc.add_font(&font))
        };
        Ok(Self {
            regular: add(BuiltinFont::Helvetica)?,
            bold: add(BuiltinFont::HelveticaBold)?,
            mono: add(BuiltinFont::Courier)?,
        })
    }

    fn get(&self, face: Face) -> &FontId {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Mono => &self.mono,
        }
    }
}

/// Accumulates drawing operations and starts new pages as lines run out.
struct Layout {
    fonts: Fonts,
    layer: LayerInternalId,
    pages: Vec<PdfPage>,
    ops: Vec<Op>,
    /// Distance from the top edge of the current page, in points.
    cursor: f32,
}

impl Layout {
    fn new(fonts: Fonts, layer: LayerInternalId) -> Self {
        let mut layout = Self {
            fonts,
            layer,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: 0.0,
        };
        layout.begin_page();
        layout
    }

    fn top() -> f32 {
        MARGIN.0 * PT_PER_MM
    }

    fn bottom() -> f32 {
        (PAGE_HEIGHT.0 - MARGIN.0) * PT_PER_MM
    }

    fn usable_width() -> f32 {
        (PAGE_WIDTH.0 - 2.0 * MARGIN.0) * PT_PER_MM
    }

    fn begin_page(&mut self) {
        self.ops.push(Op::BeginLayer {
            layer_id: self.layer.clone(),
        });
        self.cursor = Self::top();
    }

    fn finish_page(&mut self) {
        self.ops.push(Op::EndLayer {
            layer_id: self.layer.clone(),
        });
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(PdfPage::new(PAGE_WIDTH, PAGE_HEIGHT, ops));
    }

    fn space(&mut self, points: f32) {
        if self.cursor > Self::top() {
            self.cursor += points;
        }
    }

    fn line(&mut self, text: &str, face: Face, size: f32, indent: f32) {
        let leading = size * 1.35;
        if self.cursor + leading > Self::bottom() {
            self.finish_page();
            self.begin_page();
        }
        self.cursor += leading;
        let x = MARGIN.0 * PT_PER_MM + indent;
        let y = PAGE_HEIGHT.0 * PT_PER_MM - self.cursor;
        let font = self.fonts.get(face).clone();
        self.ops.extend([
            Op::StartTextSection,
            Op::SetFontSize {
                size: Pt(size),
                font: font.clone(),
            },
            Op::SetTextMatrix {
                matrix: TextMatrix::Translate(Pt(x), Pt(y)),
            },
            Op::SetTextRenderingMode {
                mode: TextRenderingMode::Fill,
            },
            Op::WriteText {
                items: vec![TextItem::Text(text.to_string())],
                font,
            },
            Op::EndTextSection,
        ]);
    }

    fn wrapped(&mut self, text: &str, face: Face, size: f32, indent: f32) {
        let max_chars = ((Self::usable_width() - indent) / (size * face.width_factor())) as usize;
        for line in wrap(text, max_chars) {
            self.line(&line, face, size, indent);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Heading { level, text } => {
                let size = match level {
                    1 => 20.0,
                    2 => 16.0,
                    3 => 14.0,
                    _ => 12.0,
                };
                self.space(size * 0.6);
                self.wrapped(text, Face::Bold, size, 0.0);
                self.space(4.0);
            }
            Block::Paragraph(text) => {
                self.wrapped(text, Face::Regular, 11.0, 0.0);
                self.space(6.0);
            }
            Block::ListItem { depth, marker, text } => {
                let indent = 14.0 * *depth as f32;
                self.wrapped(&format!("{marker} {text}"), Face::Regular, 11.0, indent);
                self.space(2.0);
            }
            Block::Preformatted(text) => {
                let max_chars = (Self::usable_width() / (9.5 * Face::Mono.width_factor())) as usize;
                for raw in text.lines() {
                    // Keep indentation; only split lines that do not fit.
                    let chars: Vec<char> = raw.chars().collect();
                    if chars.is_empty() {
                        self.line("", Face::Mono, 9.5, 0.0);
                    }
                    for chunk in chars.chunks(max_chars.max(1)) {
                        self.line(&chunk.iter().collect::<String>(), Face::Mono, 9.5, 0.0);
                    }
                }
                self.space(6.0);
            }
            Block::TableRow(cells) => {
                self.wrapped(&cells.join("  |  "), Face::Regular, 10.0, 0.0);
                self.space(2.0);
            }
            Block::Rule => {
                self.space(4.0);
                let max_chars = (Self::usable_width() / (11.0 * 0.5)) as usize;
                self.line(&"_".repeat(max_chars), Face::Regular, 11.0, 0.0);
                self.space(6.0);
            }
        }
    }

    fn finish(mut self) -> Vec<PdfPage> {
        self.finish_page();
        self.pages
    }
}

/// Renders an HTML fragment to PDF bytes.
pub fn render_pdf(html: &str) -> Result<Vec<u8>, ExportError> {
    let blocks = html_to_blocks(html);
    debug!(blocks = blocks.len(), "Laying out PDF");

    let mut doc = PdfDocument::new("Consulting Template");
    let layer = doc.add_layer(&Layer::new("Content"));
    let fonts = Fonts::load(&mut doc)?;

    let mut layout = Layout::new(fonts, layer);
    for block in &blocks {
        layout.block(block);
    }
    doc.pages.extend(layout.finish());

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "PDF generation produced warnings");
        debug!(?warnings, "PDF warnings");
    }
    Ok(bytes)
}
