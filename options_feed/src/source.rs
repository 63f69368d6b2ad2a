//! Market data provider contract and the consolidated per-cycle fetch.
//!
//! A `MarketDataSource` exposes three independent calls. `fetch_snapshot` runs all
//! three for one ticker and absorbs each failure on its own, so a broken quote
//! endpoint never hides a healthy option chain and vice versa.
use chrono::Local;
use log::{debug, warn};
use options_common::model::{
    FetchResult, Generation, HistoryBar, HistoryLookback, OptionChain, Quote,
};
use options_common::{Result, Ticker};

/// Supplier of quotes, option chains and intraday bars for a ticker.
///
/// Implementations are shared between the poller thread and the one-shot
/// immediate-fetch threads, hence `Send + Sync`. Returning empty collections is
/// the way to say "no data"; `Err` is reserved for failed calls.
pub trait MarketDataSource: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Current quote.
    fn quote(&self, ticker: &Ticker) -> Result<Quote>;

    /// Calls and puts of the nearest expiration.
    fn option_chain(&self, ticker: &Ticker) -> Result<OptionChain>;

    /// Intraday OHLC bars covering `lookback`.
    fn history(&self, ticker: &Ticker, lookback: HistoryLookback) -> Result<Vec<HistoryBar>>;

    /// Outcomes of all three calls for one poll cycle.
    ///
    /// The default makes the three calls in turn. Providers whose calls share a
    /// payload override it to fetch that payload once per cycle; each part must
    /// still fail on its own.
    fn snapshot(&self, ticker: &Ticker, lookback: HistoryLookback) -> SnapshotParts {
        SnapshotParts {
            quote: self.quote(ticker),
            chain: self.option_chain(ticker),
            history: self.history(ticker, lookback),
        }
    }
}

/// Raw per-call outcomes of one cycle, before failures are absorbed.
#[derive(Debug)]
pub struct SnapshotParts {
    /// Outcome of the quote call.
    pub quote: Result<Quote>,
    /// Outcome of the option chain call.
    pub chain: Result<OptionChain>,
    /// Outcome of the history call.
    pub history: Result<Vec<HistoryBar>>,
}

/// Run one poll cycle for `ticker` through [`MarketDataSource::snapshot`] and bundle it.
///
/// Never fails: a failed quote becomes [`Quote::unavailable`], a failed chain an
/// empty chain and failed history an empty bar list. History is reduced to
/// weekday bars whatever the provider returned.
pub fn fetch_snapshot(
    source: &dyn MarketDataSource,
    ticker: &Ticker,
    generation: Generation,
    lookback: HistoryLookback,
) -> FetchResult {
    let parts = source.snapshot(ticker, lookback);

    let quote = parts.quote.unwrap_or_else(|e| {
        warn!("[{}] quote for {} failed: {}", source.name(), ticker, e);
        Quote::unavailable()
    });

    let chain = parts.chain.unwrap_or_else(|e| {
        warn!("[{}] option chain for {} failed: {}", source.name(), ticker, e);
        OptionChain::empty()
    });

    let history = match parts.history {
        Ok(bars) => HistoryBar::weekday_bars(bars),
        Err(e) => {
            warn!("[{}] history for {} failed: {}", source.name(), ticker, e);
            Vec::new()
        }
    };

    debug!(
        "[{}] {} {}: calls={} puts={} bars={}",
        source.name(),
        ticker,
        generation,
        chain.calls.len(),
        chain.puts.len(),
        history.len()
    );

    FetchResult {
        ticker: ticker.clone(),
        generation,
        fetched_at: Local::now(),
        quote,
        chain,
        history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use options_common::model::{OptionContractRow, PriceField};
    use options_common::TrackerError;

    struct HalfBroken;

    impl MarketDataSource for HalfBroken {
        fn name(&self) -> &str {
            "half-broken"
        }

        fn quote(&self, _ticker: &Ticker) -> Result<Quote> {
            Err(TrackerError::provider("quote", "HTTP 500"))
        }

        fn option_chain(&self, ticker: &Ticker) -> Result<OptionChain> {
            let call = OptionContractRow::new(format!("{ticker}C"), 1.0, Some(7), None, 10.0);
            Ok(OptionChain::new(None, vec![call], Vec::new()))
        }

        fn history(&self, _ticker: &Ticker, _lookback: HistoryLookback) -> Result<Vec<HistoryBar>> {
            let offset = FixedOffset::east_opt(0).unwrap();
            // Saturday and Monday.
            let sat = offset.with_ymd_and_hms(2024, 6, 8, 10, 0, 0).unwrap();
            let mon = offset.with_ymd_and_hms(2024, 6, 10, 10, 0, 0).unwrap();
            Ok([sat, mon]
                .into_iter()
                .filter_map(|ts| HistoryBar::from_parts(ts, Some(1.0), Some(2.0), Some(0.5), Some(1.5)))
                .collect())
        }
    }

    #[test]
    fn failed_quote_does_not_abort_the_cycle() {
        let ticker: Ticker = "spy".parse().unwrap();
        let result = fetch_snapshot(&HalfBroken, &ticker, Generation::new(3), HistoryLookback::default());

        assert_eq!(result.ticker, ticker);
        assert_eq!(result.generation, Generation::new(3));
        assert_eq!(result.quote.current_price, PriceField::Unavailable);
        assert!(!result.quote.is_complete());
        assert_eq!(result.chain.calls.len(), 1);
        assert_eq!(result.chain.summary.largest_call_symbol, "SPYC");
        assert_eq!(result.history.len(), 1, "weekend bar must be filtered");
    }
}
