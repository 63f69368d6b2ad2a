//! Colored dashboard for an interactive terminal.
use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};
use options_common::format::{currency, summary_text, timestamp};
use options_common::model::{OptionContractRow, OptionSide};
use options_common::Result;

use super::chart::{CandleChart, CHART_HEIGHT};
use super::{Banner, DashboardView, DisplayRenderer};

/// Rows shown per option table.
const TABLE_ROWS: usize = 12;
const PROMPT: &str = "Enter ticker (:q to quit) > ";

/// Redraws the whole dashboard in place on every applied snapshot.
pub struct TerminalRenderer<W: Write> {
    out: W,
    colors: bool,
    frames: u64,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        TerminalRenderer {
            out,
            colors: true,
            frames: 0,
        }
    }

    /// Disable ANSI colors, e.g. when output is not a TTY.
    pub fn without_colors(mut self) -> Self {
        self.colors = false;
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> Result<()> {
        queue!(self.out, Print(text), Print("\r\n"))?;
        Ok(())
    }

    fn banner(&mut self, banner: &Banner) -> Result<()> {
        if !self.colors {
            return self.line(banner.text());
        }
        let styled = match banner {
            Banner::Up(text) => text.clone().green().bold(),
            Banner::Down(text) => text.clone().red().bold(),
            Banner::Unavailable(text) => text.clone().bold(),
        };
        queue!(self.out, PrintStyledContent(styled), Print("\r\n"))?;
        Ok(())
    }

    fn option_table(&mut self, side: OptionSide, rows: &[OptionContractRow]) -> Result<()> {
        let title = match side {
            OptionSide::Call => "Call Options",
            OptionSide::Put => "Put Options",
        };
        self.line(title)?;
        self.line(&format!(
            "{:<22} {:>10} {:>9} {:>13} {:>9}",
            "Contract Symbol", "Last Price", "Volume", "Open Interest", "Strike"
        ))?;
        if rows.is_empty() {
            return self.line("  no contracts");
        }
        for row in rows.iter().take(TABLE_ROWS) {
            self.line(&format!(
                "{:<22} {:>10.2} {:>9} {:>13} {:>9.2}",
                row.symbol, row.last_price, row.volume, row.open_interest, row.strike
            ))?;
        }
        if rows.len() > TABLE_ROWS {
            self.line(&format!("  ... {} more", rows.len() - TABLE_ROWS))?;
        }
        Ok(())
    }

    fn price_changes(&mut self, view: &DashboardView<'_>) -> Result<()> {
        self.line("Price Changes")?;
        self.line(&format!("{:<19}  {:>10}  {:>9}", "Time", "Price", "Change"))?;
        for entry in &view.recent_prices {
            let change = format!("{:>9}", currency(entry.change));
            let time = timestamp(&entry.timestamp);
            let price = currency(entry.price);
            if self.colors && entry.change != 0.0 {
                let styled = if entry.change > 0.0 { change.green() } else { change.red() };
                queue!(
                    self.out,
                    Print(format!("{:<19}  {:>10}  ", time, price)),
                    PrintStyledContent(styled),
                    Print("\r\n")
                )?;
            } else {
                self.line(&format!("{:<19}  {:>10}  {}", time, price, change))?;
            }
        }
        Ok(())
    }

    fn chart(&mut self, view: &DashboardView<'_>) -> Result<()> {
        let Some(chart) = CandleChart::build(view.ticker, view.history, CHART_HEIGHT) else {
            return self.line(&format!("{} Hourly Stock Price (Weekdays Only): no data", view.ticker));
        };
        if !self.colors {
            for line in chart.to_plain_text().lines() {
                self.line(line)?;
            }
            return Ok(());
        }

        self.line(&chart.title)?;
        for row in &chart.rows {
            queue!(self.out, Print(&row.label))?;
            for cell in &row.cells {
                let glyph = format!("{} ", cell.glyph());
                match cell.bullish() {
                    Some(true) => queue!(self.out, PrintStyledContent(glyph.green()))?,
                    Some(false) => queue!(self.out, PrintStyledContent(glyph.red()))?,
                    None => queue!(self.out, Print(glyph))?,
                }
            }
            queue!(self.out, Print("\r\n"))?;
        }
        self.line(&chart.x_axis)
    }
}

impl<W: Write> DisplayRenderer for TerminalRenderer<W> {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;

        self.banner(&Banner::for_view(view))?;
        self.line(&format!(
            "Expiration: {}   Session: {}",
            view.expiration.unwrap_or("N/A"),
            view.generation
        ))?;
        self.line("")?;
        for line in summary_text(view.summary).lines() {
            self.line(line)?;
        }
        self.line("")?;
        self.option_table(OptionSide::Call, view.calls)?;
        self.line("")?;
        self.option_table(OptionSide::Put, view.puts)?;
        self.line("")?;
        self.price_changes(view)?;
        self.line("")?;
        self.chart(view)?;
        self.line("")?;
        queue!(self.out, Print(PROMPT))?;

        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        execute!(self.out, Print("\r\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::{quote, Fixture};
    use chrono::Local;
    use options_common::model::{PriceHistoryEntry, Quote};

    fn render_plain(fixture: &Fixture, recent: Vec<PriceHistoryEntry>) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new()).without_colors();
        let mut view = fixture.view();
        view.recent_prices = recent;
        renderer.render(&view).unwrap();
        assert_eq!(renderer.frames(), 1);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn dashboard_sections_are_printed() {
        let fixture = Fixture::new(quote(101.0, 100.0));
        let entry = PriceHistoryEntry {
            timestamp: Local::now(),
            price: 101.0,
            change: 1.5,
        };
        let out = render_plain(&fixture, vec![entry]);
        assert!(out.contains("SPY: $101.00 | Bid: $100.90"));
        assert!(out.contains("Total Active Contracts: 1"));
        assert!(out.contains("Largest Put: N/A"));
        assert!(out.contains("SPY240614C00510000"));
        assert!(out.contains("Price Changes"));
        assert!(out.contains("$1.50"));
        assert!(out.contains("Expiration: 2024-06-14"));
        assert!(out.contains("no data"));
        assert!(out.ends_with(PROMPT));
    }

    #[test]
    fn empty_snapshot_renders_unavailable_banner() {
        let mut fixture = Fixture::new(Quote::unavailable());
        fixture.chain = Default::default();
        let out = render_plain(&fixture, Vec::new());
        assert!(out.contains("SPY: Data N/A"));
        assert!(out.contains("Total Active Contracts: 0"));
        assert!(out.contains("no contracts"));
    }

    #[test]
    fn colored_output_carries_ansi_sequences() {
        let fixture = Fixture::new(quote(99.0, 100.0));
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render(&fixture.view()).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains('\u{1b}'));
        assert!(out.contains("SPY: $99.00"));
    }
}
