//! Yahoo Finance market data over blocking HTTP.
//!
//! Uses the public chart endpoint for prices and bars and the options endpoint
//! for the nearest expiration. Bid and ask only come with the options payload;
//! when that call is refused the quote keeps them unavailable.
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use log::debug;
use options_common::model::{
    HistoryBar, HistoryLookback, OptionChain, OptionContractRow, PriceField, Quote,
};
use options_common::{Result, Ticker, TrackerError};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::source::{MarketDataSource, SnapshotParts};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) options-tracker";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<OhlcSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct OhlcSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsEnvelope {
    option_chain: OptionsBody,
}

#[derive(Debug, Deserialize)]
struct OptionsBody {
    #[serde(default)]
    result: Option<Vec<OptionsResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    quote: Option<OptionsQuote>,
    #[serde(default)]
    options: Vec<OptionsExpiry>,
}

#[derive(Debug, Deserialize)]
struct OptionsQuote {
    bid: Option<f64>,
    ask: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsExpiry {
    expiration_date: i64,
    #[serde(default)]
    calls: Vec<YahooContract>,
    #[serde(default)]
    puts: Vec<YahooContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooContract {
    contract_symbol: String,
    #[serde(default)]
    last_price: f64,
    volume: Option<u64>,
    open_interest: Option<u64>,
    strike: f64,
}

impl From<YahooContract> for OptionContractRow {
    fn from(c: YahooContract) -> Self {
        OptionContractRow::new(c.contract_symbol, c.last_price, c.volume, c.open_interest, c.strike)
    }
}

/// Blocking Yahoo Finance client.
pub struct YahooSource {
    client: Client,
    base_url: String,
}

impl YahooSource {
    /// Client against [`DEFAULT_BASE_URL`].
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against another host, e.g. a local mock.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TrackerError::provider("connect", e.to_string()))?;
        Ok(YahooSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TrackerError::provider(operation, e.to_string()))?;
        let body = response
            .text()
            .map_err(|e| TrackerError::provider(operation, e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn chart(&self, operation: &'static str, ticker: &Ticker, range: String, interval: String) -> Result<ChartResult> {
        let envelope: ChartEnvelope = self.get_json(
            operation,
            &format!("/v8/finance/chart/{ticker}"),
            &[("range", range), ("interval", interval)],
        )?;
        first_result(operation, envelope.chart.result, envelope.chart.error)
    }

    fn options(&self, ticker: &Ticker) -> Result<OptionsResult> {
        let envelope: OptionsEnvelope =
            self.get_json("option_chain", &format!("/v7/finance/options/{ticker}"), &[])?;
        first_result("option_chain", envelope.option_chain.result, envelope.option_chain.error)
    }
}

fn first_result<T>(operation: &'static str, result: Option<Vec<T>>, error: Option<ApiError>) -> Result<T> {
    if let Some(err) = error {
        return Err(TrackerError::provider(operation, format!("{}: {}", err.code, err.description)));
    }
    result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| TrackerError::provider(operation, "empty result"))
}

/// Turn a chart payload into bars in the exchange's offset.
fn bars_from_chart(chart: &ChartResult) -> Vec<HistoryBar> {
    let Some(offset) = FixedOffset::east_opt(chart.meta.gmtoffset) else {
        return Vec::new();
    };
    let series = chart.indicators.quote.first();
    let at = |values: Option<&Vec<Option<f64>>>, i: usize| values.and_then(|v| v.get(i).copied().flatten());

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let timestamp: DateTime<FixedOffset> = DateTime::<Utc>::from_timestamp(ts, 0)?.with_timezone(&offset);
            HistoryBar::from_parts(
                timestamp,
                at(series.map(|s| &s.open), i),
                at(series.map(|s| &s.high), i),
                at(series.map(|s| &s.low), i),
                at(series.map(|s| &s.close), i),
            )
        })
        .collect()
}

/// Quote from the daily chart; bid and ask only when the options call succeeded.
fn quote_from(ticker: &Ticker, daily: &ChartResult, options: &Result<OptionsResult>) -> Quote {
    let bars = bars_from_chart(daily);
    let latest = bars.last();
    let (bid, ask) = match options {
        Ok(result) => result.quote.as_ref().map_or((None, None), |q| (q.bid, q.ask)),
        Err(e) => {
            debug!("bid/ask for {} unavailable: {}", ticker, e);
            (None, None)
        }
    };
    Quote::new(
        PriceField::from(daily.meta.regular_market_price),
        PriceField::from(bid),
        PriceField::from(ask),
        PriceField::from(latest.map(|b| b.close)),
        PriceField::from(latest.map(|b| b.open)),
    )
}

/// Nearest expiration of an options payload. No expirations is an empty chain.
fn chain_from(ticker: &Ticker, result: OptionsResult) -> OptionChain {
    if result.expiration_dates.is_empty() {
        debug!("no option expirations for {}", ticker);
        return OptionChain::empty();
    }
    let Some(nearest) = result.options.into_iter().next() else {
        return OptionChain::empty();
    };
    OptionChain::new(
        expiration_label(nearest.expiration_date),
        nearest.calls.into_iter().map(OptionContractRow::from).collect(),
        nearest.puts.into_iter().map(OptionContractRow::from).collect(),
    )
}

fn expiration_label(epoch: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|dt| dt.date_naive())
        .map(|d: NaiveDate| d.format("%Y-%m-%d").to_string())
}

impl MarketDataSource for YahooSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn quote(&self, ticker: &Ticker) -> Result<Quote> {
        let daily = self.chart("quote", ticker, "2d".to_string(), "1d".to_string())?;
        let options = self.options(ticker);
        Ok(quote_from(ticker, &daily, &options))
    }

    fn option_chain(&self, ticker: &Ticker) -> Result<OptionChain> {
        self.options(ticker).map(|result| chain_from(ticker, result))
    }

    fn history(&self, ticker: &Ticker, lookback: HistoryLookback) -> Result<Vec<HistoryBar>> {
        let chart = self.chart("history", ticker, lookback.range_label(), lookback.interval_label())?;
        Ok(bars_from_chart(&chart))
    }

    /// Bid/ask and the chain come from the same options payload, requested once.
    fn snapshot(&self, ticker: &Ticker, lookback: HistoryLookback) -> SnapshotParts {
        let options = self.options(ticker);
        let quote = self
            .chart("quote", ticker, "2d".to_string(), "1d".to_string())
            .map(|daily| quote_from(ticker, &daily, &options));
        SnapshotParts {
            quote,
            chain: options.map(|result| chain_from(ticker, result)),
            history: self.history(ticker, lookback),
        }
    }
}
