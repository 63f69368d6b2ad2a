//! Offline market data source driven by a per-ticker random walk.
//!
//! Every quote call moves the ticker's price by a uniform step in `[-1%, +1%]`,
//! clamped to a positive minimum. Bid and ask straddle the price, the option
//! chain is a strike ladder around it and the history is a walk that ends at
//! the current price. Last prices live in a `HashMap<Ticker, _>` so every
//! caller observes the same sequence for a ticker.
//!
//! Individual calls can be made to fail with [`SimulatedFailures`], which is how
//! the partial-failure paths of the pipeline are exercised without a network.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use log::debug;
use options_common::model::{
    HistoryBar, HistoryLookback, OptionChain, OptionContractRow, PriceField, Quote,
};
use options_common::{Result, Ticker, TrackerError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::source::MarketDataSource;

/// Strikes on each side of the at-the-money strike.
const STRIKES_PER_SIDE: i64 = 5;
/// Half of the bid/ask spread as a fraction of the price.
const HALF_SPREAD: f64 = 0.0005;
/// Chance that a contract is reported without volume.
const MISSING_VOLUME_PROBABILITY: f64 = 0.125;
/// First bar of the regular session, local hour.
const SESSION_OPEN_HOUR: u32 = 9;
/// Bars per regular session at the default hourly interval.
const SESSION_BARS: u32 = 7;

/// Switches that make individual calls fail.
#[derive(Debug, Default)]
pub struct SimulatedFailures {
    /// Fail `quote`.
    pub quote: AtomicBool,
    /// Fail `option_chain`.
    pub option_chain: AtomicBool,
    /// Fail `history`.
    pub history: AtomicBool,
}

#[derive(Debug, Clone, Copy)]
struct TickerState {
    price: f64,
    last_close: f64,
    open: f64,
}

/// Random-walk market data for any ticker.
pub struct SimulatedSource {
    rng: Mutex<StdRng>,
    states: Mutex<HashMap<Ticker, TickerState>>,
    failures: SimulatedFailures,
}

impl SimulatedSource {
    /// Source seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic source for tests and reproducible demos.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        SimulatedSource {
            rng: Mutex::new(rng),
            states: Mutex::new(HashMap::new()),
            failures: SimulatedFailures::default(),
        }
    }

    /// Failure switches; flip them at any time, they apply to the next call.
    pub fn failures(&self) -> &SimulatedFailures {
        &self.failures
    }

    /// Starting price of a ticker, stable across runs.
    fn initial_price(ticker: &Ticker) -> f64 {
        let spread = ticker
            .as_str()
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        50.0 + (spread % 450) as f64
    }

    /// Next price of a uniform `[-1%, +1%]` walk, clamped to stay positive.
    pub fn next_price(rng: &mut impl Rng, current_price: f64) -> f64 {
        let change: f64 = rng.random_range(-0.01..0.01);
        (current_price * (1.0 + change)).max(0.01)
    }

    fn check(flag: &AtomicBool, operation: &'static str) -> Result<()> {
        if flag.load(Ordering::Relaxed) {
            return Err(TrackerError::provider(operation, "simulated outage"));
        }
        Ok(())
    }

    fn state_entry<'a>(states: &'a mut HashMap<Ticker, TickerState>, ticker: &Ticker) -> &'a mut TickerState {
        states.entry(ticker.clone()).or_insert_with(|| {
            let price = Self::initial_price(ticker);
            TickerState {
                price,
                last_close: price * 0.995,
                open: price * 0.998,
            }
        })
    }

    fn current_state(&self, ticker: &Ticker) -> Result<TickerState> {
        let mut states = self.states.lock()?;
        Ok(*Self::state_entry(&mut states, ticker))
    }

    fn nearest_friday(today: NaiveDate) -> NaiveDate {
        let ahead = (7 + Weekday::Fri.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            % 7;
        today + Duration::days(ahead)
    }

    fn strike_step(price: f64) -> f64 {
        match price {
            p if p < 25.0 => 0.5,
            p if p < 100.0 => 1.0,
            p if p < 250.0 => 2.5,
            _ => 5.0,
        }
    }

    fn contract_symbol(ticker: &Ticker, expiration: NaiveDate, side: char, strike: f64) -> String {
        format!(
            "{}{}{}{:08}",
            ticker,
            expiration.format("%y%m%d"),
            side,
            (strike * 1000.0).round() as u64
        )
    }

    fn contract(
        rng: &mut StdRng,
        symbol: String,
        intrinsic: f64,
        strike: f64,
    ) -> OptionContractRow {
        let time_value: f64 = rng.random_range(0.05..2.5);
        let volume = if rng.random_bool(MISSING_VOLUME_PROBABILITY) {
            None
        } else {
            Some(rng.random_range(0..5_000))
        };
        let open_interest = Some(rng.random_range(0..20_000));
        OptionContractRow::new(
            symbol,
            intrinsic.max(0.0) + time_value,
            volume,
            open_interest,
            strike,
        )
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    fn quote(&self, ticker: &Ticker) -> Result<Quote> {
        Self::check(&self.failures.quote, "quote")?;
        // One step per call: read, step and store under the same `states` guard.
        // Lock order is `states` then `rng`.
        let state = {
            let mut states = self.states.lock()?;
            let state = Self::state_entry(&mut states, ticker);
            let mut rng = self.rng.lock()?;
            state.price = Self::next_price(&mut *rng, state.price);
            *state
        };
        let price = state.price;

        let half_spread = price * HALF_SPREAD;
        Ok(Quote::new(
            PriceField::from(price),
            PriceField::from(price - half_spread),
            PriceField::from(price + half_spread),
            PriceField::from(state.last_close),
            PriceField::from(state.open),
        ))
    }

    fn option_chain(&self, ticker: &Ticker) -> Result<OptionChain> {
        Self::check(&self.failures.option_chain, "option_chain")?;
        let state = self.current_state(ticker)?;
        let expiration = Self::nearest_friday(Local::now().date_naive());
        let step = Self::strike_step(state.price);
        let atm = (state.price / step).round() * step;

        let mut rng = self.rng.lock()?;
        let mut calls = Vec::new();
        let mut puts = Vec::new();
        for offset in -STRIKES_PER_SIDE..=STRIKES_PER_SIDE {
            let strike = atm + offset as f64 * step;
            if strike <= 0.0 {
                continue;
            }
            calls.push(Self::contract(
                &mut rng,
                Self::contract_symbol(ticker, expiration, 'C', strike),
                state.price - strike,
                strike,
            ));
            puts.push(Self::contract(
                &mut rng,
                Self::contract_symbol(ticker, expiration, 'P', strike),
                strike - state.price,
                strike,
            ));
        }
        debug!("simulated chain for {}: {} strikes", ticker, calls.len());
        Ok(OptionChain::new(
            Some(expiration.format("%Y-%m-%d").to_string()),
            calls,
            puts,
        ))
    }

    fn history(&self, ticker: &Ticker, lookback: HistoryLookback) -> Result<Vec<HistoryBar>> {
        Self::check(&self.failures.history, "history")?;
        let state = self.current_state(ticker)?;
        let interval = lookback.interval_minutes.max(1);
        let bars_per_day = (SESSION_BARS * 60 / interval).max(1);
        let today = Local::now().date_naive();

        let mut slots = Vec::new();
        for day_back in (0..i64::from(lookback.days)).rev() {
            let date = today - Duration::days(day_back);
            for slot in 0..bars_per_day {
                let minutes = SESSION_OPEN_HOUR * 60 + 30 + slot * interval;
                let Some(naive) = date.and_hms_opt(minutes / 60, minutes % 60, 0) else {
                    continue;
                };
                if let Some(at) = naive.and_local_timezone(Local).earliest() {
                    slots.push(at.fixed_offset());
                }
            }
        }

        // Walk backwards from the current price so the chart ends where the quote is.
        let mut rng = self.rng.lock()?;
        let mut close = state.price;
        let mut bars = Vec::with_capacity(slots.len());
        for timestamp in slots.into_iter().rev() {
            let open = Self::next_price(&mut *rng, close);
            let wick: f64 = rng.random_range(0.0..0.004);
            let high = open.max(close) * (1.0 + wick);
            let low = open.min(close) * (1.0 - wick);
            if let Some(bar) = HistoryBar::from_parts(timestamp, Some(open), Some(high), Some(low), Some(close)) {
                bars.push(bar);
            }
            close = open;
        }
        Ok(HistoryBar::weekday_bars(bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spy() -> Ticker {
        "SPY".parse().unwrap()
    }

    #[test]
    fn quotes_are_complete_and_walk_within_one_percent() {
        let source = SimulatedSource::seeded(7);
        let first = source.quote(&spy()).unwrap();
        let second = source.quote(&spy()).unwrap();
        assert!(first.is_complete());
        let (a, b) = (first.current_price.value().unwrap(), second.current_price.value().unwrap());
        assert!((b - a).abs() <= a * 0.01 + 1e-9);
        assert!(first.bid.value().unwrap() < first.ask.value().unwrap());
    }

    #[test]
    fn same_seed_same_prices() {
        let a = SimulatedSource::seeded(42).quote(&spy()).unwrap();
        let b = SimulatedSource::seeded(42).quote(&spy()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chain_is_symmetric_ladder() {
        let chain = SimulatedSource::seeded(1).option_chain(&spy()).unwrap();
        assert_eq!(chain.calls.len(), chain.puts.len());
        assert_eq!(chain.summary.total_contracts, chain.calls.len() * 2);
        assert!(chain.expiration.is_some());
        assert!(chain.calls.iter().all(|c| c.symbol.starts_with("SPY") && c.symbol.contains('C')));
    }

    #[test]
    fn history_contains_weekdays_only() {
        let bars = SimulatedSource::seeded(3)
            .history(&spy(), HistoryLookback::default())
            .unwrap();
        assert!(!bars.is_empty());
        assert!(bars.iter().all(HistoryBar::is_weekday));
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(bars.iter().all(|b| b.low <= b.open.min(b.close) && b.high >= b.open.max(b.close)));
    }

    #[test]
    fn failure_switches_apply_per_call() {
        let source = SimulatedSource::seeded(9);
        source.failures().quote.store(true, Ordering::Relaxed);
        assert!(matches!(
            source.quote(&spy()),
            Err(TrackerError::Provider { operation: "quote", .. })
        ));
        assert!(source.option_chain(&spy()).is_ok());
        source.failures().quote.store(false, Ordering::Relaxed);
        assert!(source.quote(&spy()).is_ok());
    }

    #[test]
    fn concurrent_quotes_never_lose_a_step() {
        const THREADS: usize = 4;
        const CALLS: usize = 250;
        let price = |q: Quote| q.current_price.value().unwrap();

        let sequential = SimulatedSource::seeded(11);
        let mut expected: Vec<f64> = (0..THREADS * CALLS)
            .map(|_| price(sequential.quote(&spy()).unwrap()))
            .collect();

        // Each call steps the price exactly once whichever thread makes it, so
        // the seeded walk yields the same prices as the sequential run.
        let shared = SimulatedSource::seeded(11);
        let mut observed: Vec<f64> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        (0..CALLS)
                            .map(|_| price(shared.quote(&spy()).unwrap()))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
        });

        expected.sort_by(f64::total_cmp);
        observed.sort_by(f64::total_cmp);
        assert_eq!(observed, expected);
    }

    #[test]
    fn nearest_friday_rolls_forward() {
        let wed = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        let fri = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
        assert_eq!(SimulatedSource::nearest_friday(wed), fri);
        assert_eq!(SimulatedSource::nearest_friday(fri), fri);
    }
}
