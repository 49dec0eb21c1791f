//! # Bar Chart Rendering
//!
//! Renders a [`Series`] as a PNG bar chart: one vertical bar per entry, in the
//! series' own order. Bars are never re-sorted here; the extractor already
//! guarantees ascending keys.

mod font;

use crate::{
    errors::ChartError,
    types::{format_number, Series},
};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 500;
pub const CHART_TITLE: &str = "Bar Graph Visualization";
pub const X_AXIS_LABEL: &str = "Year";
pub const Y_AXIS_LABEL: &str = "Value";
/// `#1976d2`.
pub const BAR_COLOR: Rgb<u8> = Rgb([0x19, 0x76, 0xd2]);

const BACKGROUND: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const INK: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
const GRID: Rgb<u8> = Rgb([0xe0, 0xe0, 0xe0]);

const MARGIN_LEFT: u32 = 90;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 70;
const MARGIN_BOTTOM: u32 = 80;
const Y_TICKS: u32 = 5;
const BAR_FILL_RATIO: f64 = 0.7;

/// Pixel rectangle of one bar, `top` inclusive and `bottom` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRect {
    pub x: u32,
    pub width: u32,
    pub top: u32,
    pub bottom: u32,
}

/// Where everything lands on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub bars: Vec<BarRect>,
    /// Row of the value-zero line.
    pub baseline: u32,
    pub y_min: f64,
    pub y_max: f64,
}

fn plot_left() -> u32 {
    MARGIN_LEFT
}
fn plot_right() -> u32 {
    CHART_WIDTH - MARGIN_RIGHT
}
fn plot_top() -> u32 {
    MARGIN_TOP
}
fn plot_bottom() -> u32 {
    CHART_HEIGHT - MARGIN_BOTTOM
}

/// Computes bar geometry for `series` without drawing anything.
pub fn layout(series: &Series) -> Result<ChartLayout, ChartError> {
    let points = series.points();
    if points.is_empty() {
        return Err(ChartError::EmptySeries);
    }

    let (mut y_min, mut y_max) = points.iter().fold((0.0_f64, 0.0_f64), |(lo, hi), p| {
        (lo.min(p.value), hi.max(p.value))
    });
    if y_max - y_min <= f64::EPSILON {
        y_max = y_min + 1.0;
    }
    // Headroom so the tallest bar does not touch the frame.
    let span = y_max - y_min;
    if y_max > 0.0 {
        y_max += span * 0.05;
    }
    if y_min < 0.0 {
        y_min -= span * 0.05;
    }

    let plot_height = f64::from(plot_bottom() - plot_top());
    let to_row = |v: f64| -> u32 {
        let frac = (v - y_min) / (y_max - y_min);
        let row = f64::from(plot_bottom()) - frac * plot_height;
        row.round().clamp(f64::from(plot_top()), f64::from(plot_bottom())) as u32
    };
    let baseline = to_row(0.0);

    let plot_width = f64::from(plot_right() - plot_left());
    let slot = plot_width / points.len() as f64;
    let width = ((slot * BAR_FILL_RATIO).floor() as u32).max(1);

    let bars = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let center = f64::from(plot_left()) + slot * (i as f64 + 0.5);
            let x = (center - f64::from(width) / 2.0).round().max(0.0) as u32;
            let row = to_row(p.value);
            let (top, bottom) = if row <= baseline {
                (row, baseline)
            } else {
                (baseline + 1, row + 1)
            };
            BarRect {
                x,
                width,
                top,
                bottom,
            }
        })
        .collect();

    Ok(ChartLayout {
        bars,
        baseline,
        y_min,
        y_max,
    })
}

/// Renders `series` to PNG bytes.
pub fn render_bar_chart(series: &Series) -> Result<Vec<u8>, ChartError> {
    let chart = layout(series)?;
    let mut canvas = Canvas::new();

    // Horizontal grid lines and y tick labels.
    for tick in 0..=Y_TICKS {
        let value = chart.y_min + (chart.y_max - chart.y_min) * f64::from(tick) / f64::from(Y_TICKS);
        let frac = f64::from(tick) / f64::from(Y_TICKS);
        let row = (f64::from(plot_bottom()) - frac * f64::from(plot_bottom() - plot_top())).round() as u32;
        canvas.hline(plot_left(), plot_right(), row, GRID);
        let label = tick_label(value);
        let label_width = font::text_width(&label, 1);
        let x = plot_left().saturating_sub(label_width + 8);
        canvas.text(&label, x, row.saturating_sub(font::GLYPH_HEIGHT / 2), 1, INK);
    }

    for bar in &chart.bars {
        canvas.fill(bar.x, bar.top, bar.width, bar.bottom.saturating_sub(bar.top), BAR_COLOR);
    }

    // Axes.
    canvas.vline(plot_left(), plot_top(), plot_bottom(), INK);
    canvas.hline(plot_left(), plot_right(), chart.baseline, INK);

    // Category labels under each bar.
    let labels: Vec<String> = series.points().iter().map(|p| format_number(p.key)).collect();
    let slot_width = chart.bars.first().map(|b| b.width).unwrap_or(1);
    let scale = if labels.iter().all(|l| font::text_width(l, 2) <= slot_width) {
        2
    } else {
        1
    };
    for (bar, label) in chart.bars.iter().zip(&labels) {
        let width = font::text_width(label, scale);
        let center = bar.x + bar.width / 2;
        canvas.text(label, center.saturating_sub(width / 2), plot_bottom() + 10, scale, INK);
    }

    // Title and axis labels.
    let title_width = font::text_width(CHART_TITLE, 3);
    canvas.text(CHART_TITLE, (CHART_WIDTH - title_width) / 2, 20, 3, INK);
    let x_label_width = font::text_width(X_AXIS_LABEL, 2);
    let x_label_x = plot_left() + (plot_right() - plot_left()).saturating_sub(x_label_width) / 2;
    canvas.text(X_AXIS_LABEL, x_label_x, CHART_HEIGHT - 30, 2, INK);
    canvas.text(Y_AXIS_LABEL, 10, plot_top() - 25, 2, INK);

    canvas.encode()
}

/// Rounds tick values so labels stay short.
fn tick_label(value: f64) -> String {
    if value.abs() >= 100.0 {
        format_number(value.round())
    } else {
        format_number((value * 100.0).round() / 100.0)
    }
}

struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new() -> Self {
        Self {
            image: RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND),
        }
    }

    fn put(&mut self, x: u32, y: u32, color: Rgb<u8>) {
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, color);
        }
    }

    fn fill(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
        for dy in 0..height {
            for dx in 0..width {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    fn hline(&mut self, x0: u32, x1: u32, y: u32, color: Rgb<u8>) {
        for x in x0..=x1 {
            self.put(x, y, color);
        }
    }

    fn vline(&mut self, x: u32, y0: u32, y1: u32, color: Rgb<u8>) {
        for y in y0..=y1 {
            self.put(x, y, color);
        }
    }

    fn text(&mut self, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
        for (i, c) in text.chars().enumerate() {
            let origin = x + i as u32 * font::ADVANCE * scale;
            for (row, bits) in font::glyph(c).iter().enumerate() {
                for col in 0..font::GLYPH_WIDTH {
                    if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill(origin + col * scale, y + row as u32 * scale, scale, scale, color);
                    }
                }
            }
        }
    }

    fn encode(self) -> Result<Vec<u8>, ChartError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
