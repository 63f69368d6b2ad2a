//! Display side of the pipeline.
//!
//! The pump hands every applied snapshot to a [`DisplayRenderer`] as a
//! [`DashboardView`]. Renderers decide layout; the banner rules shared by all of
//! them live in [`Banner`].
//!
//! - `terminal`: colored dashboard redrawn in place, with a text OHLC chart.
//! - `json`: one JSON document per applied snapshot, for pipes and scripts.
pub mod chart;
pub mod json;
pub mod terminal;

use chrono::{DateTime, Local};
use options_common::format::{currency, currency_field, timestamp};
use options_common::model::{
    Generation, HistoryBar, OptionContractRow, OptionChainSummary, PriceHistoryEntry, Quote,
};
use options_common::{Result, Ticker};
use serde::Serialize;

pub use json::JsonRenderer;
pub use terminal::TerminalRenderer;

/// Everything a renderer may show for one applied snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub ticker: &'a Ticker,
    pub generation: Generation,
    pub fetched_at: DateTime<Local>,
    pub quote: &'a Quote,
    pub expiration: Option<&'a str>,
    pub calls: &'a [OptionContractRow],
    pub puts: &'a [OptionContractRow],
    pub summary: &'a OptionChainSummary,
    /// Most recent recorded prices, newest first.
    pub recent_prices: Vec<PriceHistoryEntry>,
    /// Weekday bars, oldest first.
    pub history: &'a [HistoryBar],
}

/// Headline above the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum Banner {
    /// Current price at or above the last close; shown green.
    Up(String),
    /// Current price below the last close; shown red.
    Down(String),
    /// At least one quote field is missing; shown without color.
    Unavailable(String),
}

impl Banner {
    /// Banner for a view. Any unavailable quote field yields `Unavailable`.
    pub fn for_view(view: &DashboardView<'_>) -> Banner {
        let quote = view.quote;
        let (true, Some(current), Some(last_close)) =
            (quote.is_complete(), quote.current_price.value(), quote.last_close.value())
        else {
            return Banner::Unavailable(format!("{}: Data N/A", view.ticker));
        };

        let text = format!(
            "{}: {} | Bid: {} | Mid: {} | Ask: {} | Last Market Price: {} | *Last Updated: {}*",
            view.ticker,
            currency(current),
            currency_field(quote.bid),
            currency_field(quote.mid),
            currency_field(quote.ask),
            currency(last_close),
            timestamp(&view.fetched_at)
        );
        if current >= last_close {
            Banner::Up(text)
        } else {
            Banner::Down(text)
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Banner::Up(text) | Banner::Down(text) | Banner::Unavailable(text) => text,
        }
    }
}

/// Sink for applied snapshots.
///
/// `render` is called on the display thread once per applied snapshot. An error
/// is logged by the pump and does not stop it.
pub trait DisplayRenderer {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<()>;

    /// Release display resources. Called once, after polling has stopped.
    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: DisplayRenderer + ?Sized> DisplayRenderer for Box<R> {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<()> {
        (**self).render(view)
    }

    fn teardown(&mut self) -> Result<()> {
        (**self).teardown()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use options_common::model::{OptionChain, PriceField};

    pub(crate) struct Fixture {
        pub ticker: Ticker,
        pub quote: Quote,
        pub chain: OptionChain,
    }

    impl Fixture {
        pub fn new(quote: Quote) -> Self {
            let calls = vec![OptionContractRow::new("SPY240614C00510000", 4.2, Some(120), Some(900), 510.0)];
            Fixture {
                ticker: "SPY".parse().unwrap(),
                quote,
                chain: OptionChain::new(Some("2024-06-14".into()), calls, Vec::new()),
            }
        }

        pub fn view(&self) -> DashboardView<'_> {
            DashboardView {
                ticker: &self.ticker,
                generation: Generation::FIRST,
                fetched_at: Local::now(),
                quote: &self.quote,
                expiration: self.chain.expiration.as_deref(),
                calls: &self.chain.calls,
                puts: &self.chain.puts,
                summary: &self.chain.summary,
                recent_prices: Vec::new(),
                history: &[],
            }
        }
    }

    pub(crate) fn quote(current: f64, last_close: f64) -> Quote {
        Quote::new(
            current.into(),
            (current - 0.1).into(),
            (current + 0.1).into(),
            last_close.into(),
            last_close.into(),
        )
    }

    #[test]
    fn banner_is_up_at_or_above_last_close() {
        let fixture = Fixture::new(quote(100.0, 100.0));
        let banner = Banner::for_view(&fixture.view());
        assert!(matches!(banner, Banner::Up(_)));
        assert!(banner.text().starts_with("SPY: $100.00 | Bid: $99.90 | Mid: $100.00 | Ask: $100.10 | Last Market Price: $100.00"));
    }

    #[test]
    fn banner_is_down_below_last_close() {
        let fixture = Fixture::new(quote(99.0, 100.0));
        assert!(matches!(Banner::for_view(&fixture.view()), Banner::Down(_)));
    }

    #[test]
    fn any_missing_field_means_unavailable() {
        let all_missing = Fixture::new(Quote::unavailable());
        assert_eq!(
            Banner::for_view(&all_missing.view()),
            Banner::Unavailable("SPY: Data N/A".to_string())
        );

        let no_bid = Fixture::new(Quote::new(
            101.0.into(),
            PriceField::Unavailable,
            101.2.into(),
            100.0.into(),
            100.0.into(),
        ));
        assert!(matches!(Banner::for_view(&no_bid.view()), Banner::Unavailable(_)));
    }

    #[test]
    fn missing_open_alone_means_unavailable() {
        // Price and last close are both present, so only the completeness check decides.
        let no_open = Fixture::new(Quote::new(
            101.0.into(),
            100.9.into(),
            101.1.into(),
            100.0.into(),
            PriceField::Unavailable,
        ));
        assert_eq!(
            Banner::for_view(&no_open.view()),
            Banner::Unavailable("SPY: Data N/A".to_string())
        );
    }
}
