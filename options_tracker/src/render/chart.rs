//! Text OHLC candlestick chart.
//!
//! The chart is laid out as a grid: one row per price band, two columns per bar.
//! Each cell is either empty, part of a wick (`│`, anywhere between low and
//! high) or part of a body (`┃`, between open and close). Colors are left to
//! the renderer through [`ChartCell::bullish`].
use chrono::Timelike;
use options_common::config::CHART_LABEL_FORMAT;
use options_common::format::currency;
use options_common::model::HistoryBar;
use options_common::Ticker;

pub const BODY: char = '┃';
pub const WICK: char = '│';

/// Rows of the plot area.
pub const CHART_HEIGHT: usize = 12;
/// Bars shown at most; older bars are cut from the left.
pub const CHART_MAX_BARS: usize = 40;

const COLUMN_WIDTH: usize = 2;
/// One x label every this many bars; a label is 5 characters wide.
const LABEL_EVERY: usize = 4;
const AXIS_WIDTH: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartCell {
    Empty,
    Wick { bullish: bool },
    Body { bullish: bool },
}

impl ChartCell {
    pub fn glyph(self) -> char {
        match self {
            ChartCell::Empty => ' ',
            ChartCell::Wick { .. } => WICK,
            ChartCell::Body { .. } => BODY,
        }
    }

    /// `None` for empty cells.
    pub fn bullish(self) -> Option<bool> {
        match self {
            ChartCell::Empty => None,
            ChartCell::Wick { bullish } | ChartCell::Body { bullish } => Some(bullish),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    /// Y axis label, right aligned to a fixed width.
    pub label: String,
    pub cells: Vec<ChartCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandleChart {
    pub title: String,
    pub rows: Vec<ChartRow>,
    /// `HH:MM` labels aligned under their bars.
    pub x_axis: String,
}

impl CandleChart {
    /// Lay out `bars` (oldest first). `None` when there is nothing to draw.
    pub fn build(ticker: &Ticker, bars: &[HistoryBar], height: usize) -> Option<CandleChart> {
        if bars.is_empty() || height == 0 {
            return None;
        }
        let bars = &bars[bars.len().saturating_sub(CHART_MAX_BARS)..];
        let (low, high) = price_bounds(bars);
        let step = (high - low) / height as f64;

        let rows = (0..height)
            .map(|row| {
                let band_high = high - step * row as f64;
                let band_low = band_high - step;
                // Label every third row and the bottom one.
                let label = if row % 3 == 0 || row + 1 == height {
                    format!("{:>width$} ┤", currency(band_high), width = AXIS_WIDTH - 2)
                } else {
                    format!("{:>width$}", "│", width = AXIS_WIDTH)
                };
                let cells = bars.iter().map(|bar| cell(bar, band_low, band_high)).collect();
                ChartRow { label, cells }
            })
            .collect();

        Some(CandleChart {
            title: format!("{} Hourly Stock Price (Weekdays Only)", ticker),
            rows,
            x_axis: x_axis(bars),
        })
    }

    /// Chart as plain text without colors.
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("{}\n", self.title);
        for row in &self.rows {
            out.push_str(&row.label);
            for cell in &row.cells {
                out.push(cell.glyph());
                out.push(' ');
            }
            out.push('\n');
        }
        out.push_str(&self.x_axis);
        out
    }
}

/// Low and high of all bars, widened when flat so the bands stay non-empty.
fn price_bounds(bars: &[HistoryBar]) -> (f64, f64) {
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    if high - low < f64::EPSILON {
        let pad = (high.abs() * 0.01).max(0.01);
        (low - pad, high + pad)
    } else {
        (low, high)
    }
}

fn cell(bar: &HistoryBar, band_low: f64, band_high: f64) -> ChartCell {
    let bullish = bar.is_bullish();
    let body_top = bar.open.max(bar.close);
    let body_bottom = bar.open.min(bar.close);
    // Bands are half-open at the top so a price on a boundary lands in one row.
    let overlaps = |bottom: f64, top: f64| bottom < band_high && top >= band_low;

    if overlaps(body_bottom, body_top) {
        ChartCell::Body { bullish }
    } else if overlaps(bar.low, bar.high) {
        ChartCell::Wick { bullish }
    } else {
        ChartCell::Empty
    }
}

fn x_axis(bars: &[HistoryBar]) -> String {
    let mut axis = " ".repeat(AXIS_WIDTH);
    for (i, bar) in bars.iter().enumerate().step_by(LABEL_EVERY) {
        let column = AXIS_WIDTH + i * COLUMN_WIDTH;
        let pad = column.saturating_sub(axis.chars().count());
        axis.push_str(&" ".repeat(pad));
        // Minute precision; seconds never show on hourly bars.
        let at = bar.timestamp.with_second(0).unwrap_or(bar.timestamp);
        axis.push_str(&at.format(CHART_LABEL_FORMAT).to_string());
    }
    axis.trim_end().to_string()
}
