//! Market data model shared by the feed and the tracker pipeline.
//!
//! - `PriceField`: a numeric price or an explicit "unavailable" sentinel.
//! - `Quote`: current/bid/ask/mid/last close/open snapshot for one ticker.
//! - `OptionContractRow`, `OptionChainSummary`, `OptionChain`: nearest-expiration chain.
//! - `HistoryBar`: one OHLC bar of the intraday chart.
//! - `PriceHistoryEntry`: one observed price and its delta to the previous one.
//! - `Generation`, `FetchResult`: one poll cycle tagged with its session.
use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Local, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::{HISTORY_INTERVAL_MINUTES, HISTORY_LOOKBACK_DAYS};
use crate::ticker::Ticker;

/// Label used wherever a value or symbol is missing.
pub const NOT_AVAILABLE: &str = "N/A";

/// A price that is either known or explicitly unavailable.
///
/// Serializes as a JSON number, or `null` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    /// Finite numeric value.
    Value(f64),
    /// The provider did not supply a usable value.
    #[default]
    Unavailable,
}

impl PriceField {
    /// Numeric value, if available.
    pub fn value(self) -> Option<f64> {
        match self {
            PriceField::Value(v) => Some(v),
            PriceField::Unavailable => None,
        }
    }

    /// `true` for a numeric value.
    pub fn is_available(self) -> bool {
        matches!(self, PriceField::Value(_))
    }
}

impl From<f64> for PriceField {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            PriceField::Value(value)
        } else {
            PriceField::Unavailable
        }
    }
}

impl From<Option<f64>> for PriceField {
    fn from(value: Option<f64>) -> Self {
        value.map_or(PriceField::Unavailable, PriceField::from)
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceField::Value(v) => write!(f, "{v:.2}"),
            PriceField::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Market quote for a single ticker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price of the regular session.
    pub current_price: PriceField,
    /// Best bid.
    pub bid: PriceField,
    /// Best ask.
    pub ask: PriceField,
    /// `(bid + ask) / 2`, only when both sides are numeric.
    pub mid: PriceField,
    /// Most recent close.
    pub last_close: PriceField,
    /// Most recent session open.
    pub open: PriceField,
}

impl Quote {
    /// Build a quote, deriving `mid` from `bid` and `ask`.
    pub fn new(
        current_price: PriceField,
        bid: PriceField,
        ask: PriceField,
        last_close: PriceField,
        open: PriceField,
    ) -> Self {
        let mid = match (bid, ask) {
            (PriceField::Value(b), PriceField::Value(a)) => PriceField::Value((b + a) / 2.0),
            _ => PriceField::Unavailable,
        };
        Quote {
            current_price,
            bid,
            ask,
            mid,
            last_close,
            open,
        }
    }

    /// Quote with every field unavailable; used when the quote call fails.
    pub fn unavailable() -> Self {
        Quote::default()
    }

    /// `true` only when every field carries a numeric value.
    pub fn is_complete(&self) -> bool {
        [
            self.current_price,
            self.bid,
            self.ask,
            self.mid,
            self.last_close,
            self.open,
        ]
        .iter()
        .all(|field| field.is_available())
    }
}

/// Side of an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    /// Right to buy.
    Call,
    /// Right to sell.
    Put,
}

/// One row of the call or put table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContractRow {
    /// Contract symbol, e.g. `SPY250117C00500000`.
    pub symbol: String,
    /// Last traded price of the contract.
    pub last_price: f64,
    /// Traded volume; 0 when the provider omits it.
    pub volume: u64,
    /// Open interest; 0 when the provider omits it.
    pub open_interest: u64,
    /// Strike price.
    pub strike: f64,
}

impl OptionContractRow {
    /// Build a row, defaulting missing volume and open interest to 0.
    pub fn new(
        symbol: impl Into<String>,
        last_price: f64,
        volume: Option<u64>,
        open_interest: Option<u64>,
        strike: f64,
    ) -> Self {
        OptionContractRow {
            symbol: symbol.into(),
            last_price,
            volume: volume.unwrap_or(0),
            open_interest: open_interest.unwrap_or(0),
            strike,
        }
    }
}

/// Aggregate counts for the summary block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChainSummary {
    /// Calls plus puts.
    pub total_contracts: usize,
    /// Number of call rows.
    pub total_calls: usize,
    /// Number of put rows.
    pub total_puts: usize,
    /// Call with the highest volume, or `N/A`.
    pub largest_call_symbol: String,
    /// Put with the highest volume, or `N/A`.
    pub largest_put_symbol: String,
}

impl OptionChainSummary {
    /// Summarize the given rows. On equal volume the earlier row wins.
    pub fn from_rows(calls: &[OptionContractRow], puts: &[OptionContractRow]) -> Self {
        OptionChainSummary {
            total_contracts: calls.len() + puts.len(),
            total_calls: calls.len(),
            total_puts: puts.len(),
            largest_call_symbol: Self::largest_by_volume(calls),
            largest_put_symbol: Self::largest_by_volume(puts),
        }
    }

    fn largest_by_volume(rows: &[OptionContractRow]) -> String {
        rows.iter()
            .reduce(|best, row| if row.volume > best.volume { row } else { best })
            .map(|row| row.symbol.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

impl Default for OptionChainSummary {
    fn default() -> Self {
        OptionChainSummary::from_rows(&[], &[])
    }
}

/// Calls and puts of the nearest expiration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionChain {
    /// Expiration date (`YYYY-MM-DD`) the rows belong to, when known.
    pub expiration: Option<String>,
    /// Call contracts in provider order.
    pub calls: Vec<OptionContractRow>,
    /// Put contracts in provider order.
    pub puts: Vec<OptionContractRow>,
    /// Counts and largest contracts.
    pub summary: OptionChainSummary,
}

impl OptionChain {
    /// Build a chain and its summary from rows.
    pub fn new(
        expiration: Option<String>,
        calls: Vec<OptionContractRow>,
        puts: Vec<OptionContractRow>,
    ) -> Self {
        let summary = OptionChainSummary::from_rows(&calls, &puts);
        OptionChain {
            expiration,
            calls,
            puts,
            summary,
        }
    }

    /// Chain with no expirations; not an error.
    pub fn empty() -> Self {
        OptionChain::default()
    }
}

/// One OHLC bar, timestamped in the exchange's local offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryBar {
    /// Bar open time.
    pub timestamp: DateTime<FixedOffset>,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
}

impl HistoryBar {
    /// Build a bar from provider values; `None` if any price is missing or not finite.
    pub fn from_parts(
        timestamp: DateTime<FixedOffset>,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
    ) -> Option<Self> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(HistoryBar {
            timestamp,
            open: finite(open)?,
            high: finite(high)?,
            low: finite(low)?,
            close: finite(close)?,
        })
    }

    /// `true` when the bar does not fall on a Saturday or Sunday.
    pub fn is_weekday(&self) -> bool {
        !matches!(self.timestamp.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// `true` when the bar closed at or above its open.
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Keep weekday bars only, sorted by timestamp.
    pub fn weekday_bars(bars: impl IntoIterator<Item = HistoryBar>) -> Vec<HistoryBar> {
        let mut kept: Vec<HistoryBar> = bars.into_iter().filter(HistoryBar::is_weekday).collect();
        kept.sort_by_key(|bar| bar.timestamp);
        kept
    }
}

/// How much intraday history the chart asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLookback {
    /// Calendar days of history.
    pub days: u32,
    /// Bar width in minutes.
    pub interval_minutes: u32,
}

impl HistoryLookback {
    /// Provider-style range label, e.g. `5d`.
    pub fn range_label(&self) -> String {
        format!("{}d", self.days)
    }

    /// Provider-style interval label, e.g. `1h` or `15m`.
    pub fn interval_label(&self) -> String {
        if self.interval_minutes % 60 == 0 {
            format!("{}h", self.interval_minutes / 60)
        } else {
            format!("{}m", self.interval_minutes)
        }
    }
}

impl Default for HistoryLookback {
    fn default() -> Self {
        HistoryLookback {
            days: HISTORY_LOOKBACK_DAYS,
            interval_minutes: HISTORY_INTERVAL_MINUTES,
        }
    }
}

/// One recorded price and its change against the previous record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    /// When the price was observed.
    pub timestamp: DateTime<Local>,
    /// Observed price.
    pub price: f64,
    /// `price - previous.price`, 0 for the first entry.
    pub change: f64,
}

/// Identifier of a polling session. Starts at 1 and only increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Generation of the first polling session.
    pub const FIRST: Generation = Generation(1);

    /// Wrap a raw value.
    pub fn new(value: u64) -> Self {
        Generation(value)
    }

    /// The generation that supersedes this one.
    pub fn next(self) -> Self {
        Generation(self.0.saturating_add(1))
    }

    /// Raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot produced by one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Ticker the data was fetched for.
    pub ticker: Ticker,
    /// Session that produced the snapshot.
    pub generation: Generation,
    /// Wall-clock time at which the cycle finished.
    pub fetched_at: DateTime<Local>,
    /// Quote, all-unavailable if the quote call failed.
    pub quote: Quote,
    /// Option chain, empty if the call failed or there are no expirations.
    pub chain: OptionChain,
    /// Weekday bars for the chart, empty if the call failed.
    pub history: Vec<HistoryBar>,
}

impl FetchResult {
    /// `true` when the snapshot belongs to the given session.
    pub fn belongs_to(&self, ticker: &Ticker, generation: Generation) -> bool {
        self.generation == generation && &self.ticker == ticker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(symbol: &str, volume: Option<u64>) -> OptionContractRow {
        OptionContractRow::new(symbol, 1.25, volume, None, 100.0)
    }

    fn bar_at(day: u32, hour: u32) -> HistoryBar {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let ts = offset.with_ymd_and_hms(2024, 6, day, hour, 30, 0).unwrap();
        HistoryBar::from_parts(ts, Some(10.0), Some(11.0), Some(9.5), Some(10.5)).unwrap()
    }

    #[test]
    fn mid_requires_both_sides() {
        let quote = Quote::new(
            101.0.into(),
            100.0.into(),
            102.0.into(),
            99.0.into(),
            98.0.into(),
        );
        assert_eq!(quote.mid, PriceField::Value(101.0));
        assert!(quote.is_complete());

        let one_sided = Quote::new(
            101.0.into(),
            100.0.into(),
            PriceField::Unavailable,
            99.0.into(),
            98.0.into(),
        );
        assert_eq!(one_sided.mid, PriceField::Unavailable);
        assert!(!one_sided.is_complete());
    }

    #[test]
    fn unavailable_quote_has_no_numeric_field() {
        let quote = Quote::unavailable();
        assert!(!quote.is_complete());
        assert!(!quote.current_price.is_available());
        assert_eq!(quote.bid.to_string(), "N/A");
    }

    #[test]
    fn nan_becomes_unavailable() {
        assert_eq!(PriceField::from(f64::NAN), PriceField::Unavailable);
        assert_eq!(PriceField::from(Some(f64::INFINITY)), PriceField::Unavailable);
        assert_eq!(PriceField::from(None), PriceField::Unavailable);
    }

    #[test]
    fn missing_volume_and_open_interest_default_to_zero() {
        let r = OptionContractRow::new("X", 2.0, None, None, 50.0);
        assert_eq!(r.volume, 0);
        assert_eq!(r.open_interest, 0);
    }

    #[test]
    fn summary_picks_largest_volume_and_first_on_ties() {
        let calls = vec![row("C1", Some(10)), row("C2", Some(40)), row("C3", Some(40))];
        let puts = vec![row("P1", None), row("P2", Some(3))];
        let summary = OptionChainSummary::from_rows(&calls, &puts);
        assert_eq!(summary.total_contracts, 5);
        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.total_puts, 2);
        assert_eq!(summary.largest_call_symbol, "C2");
        assert_eq!(summary.largest_put_symbol, "P2");
    }

    #[test]
    fn summary_of_empty_chain_is_not_available() {
        let summary = OptionChain::empty().summary;
        assert_eq!(summary.total_contracts, 0);
        assert_eq!(summary.largest_call_symbol, NOT_AVAILABLE);
        assert_eq!(summary.largest_put_symbol, NOT_AVAILABLE);
    }

    #[test]
    fn weekday_filter_drops_weekend_bars_and_sorts() {
        // 2024-06-07 is a Friday, 06-08/09 the weekend, 06-10 a Monday.
        let bars = vec![bar_at(10, 10), bar_at(8, 10), bar_at(7, 15), bar_at(9, 11)];
        let kept = HistoryBar::weekday_bars(bars);
        let days: Vec<u32> = kept.iter().map(|b| b.timestamp.day()).collect();
        assert_eq!(days, vec![7, 10]);
    }

    #[test]
    fn bars_with_missing_prices_are_dropped() {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 7, 10, 0, 0)
            .unwrap();
        assert!(HistoryBar::from_parts(ts, Some(1.0), None, Some(1.0), Some(1.0)).is_none());
        assert!(HistoryBar::from_parts(ts, Some(1.0), Some(f64::NAN), Some(1.0), Some(1.0)).is_none());
    }

    #[test]
    fn lookback_labels() {
        let lookback = HistoryLookback::default();
        assert_eq!(lookback.range_label(), "5d");
        assert_eq!(lookback.interval_label(), "1h");
        let fine = HistoryLookback {
            days: 1,
            interval_minutes: 15,
        };
        assert_eq!(fine.interval_label(), "15m");
    }

    #[test]
    fn generations_increase() {
        let first = Generation::FIRST;
        assert!(first.next() > first);
        assert_eq!(first.next().get(), 2);
    }

    #[test]
    fn price_field_serializes_as_number_or_null() {
        let json = serde_json::to_string(&Quote::new(
            1.5.into(),
            PriceField::Unavailable,
            2.0.into(),
            1.0.into(),
            1.0.into(),
        ))
        .unwrap();
        assert!(json.contains("\"current_price\":1.5"));
        assert!(json.contains("\"bid\":null"));
        assert!(json.contains("\"mid\":null"));
    }
}
