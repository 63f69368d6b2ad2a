//! Command-line arguments for the options tracker.
//!
//! Every value has a default matching `options_common::config`, so running the
//! binary without arguments tracks `SPY` against the simulated source.
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use options_common::config::{
    DEFAULT_TICKER, HANDOFF_CAPACITY, HISTORY_CAPACITY, POLL_INTERVAL_SECS, REFRESH_INTERVAL_MS,
};
use options_common::{TrackerError, Ticker};
use strum_macros::Display;

use crate::config::TrackerConfig;

/// Where market data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    /// Deterministic random walk, no network.
    Simulated,
    /// Public Yahoo Finance endpoints.
    Yahoo,
}

/// How snapshots are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputKind {
    /// Colored dashboard redrawn in place.
    Terminal,
    /// One JSON document per line.
    Json,
}

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about = "Live quote and option chain tracker", long_about = None)]
pub struct Args {
    /// Ticker tracked at startup.
    #[clap(long, default_value = DEFAULT_TICKER)]
    pub ticker: String,

    /// Market data provider.
    #[clap(long, value_enum, default_value_t = SourceKind::Simulated)]
    pub source: SourceKind,

    /// Seed for the simulated source; random when omitted.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Seconds between two poll cycles.
    #[clap(long, default_value_t = POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Milliseconds between two display refreshes.
    #[clap(long, default_value_t = REFRESH_INTERVAL_MS)]
    pub refresh_interval_ms: u64,

    /// Number of recorded prices kept.
    #[clap(long, default_value_t = HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Snapshots buffered between poller and display before the oldest is dropped.
    #[clap(long, default_value_t = HANDOFF_CAPACITY)]
    pub queue_capacity: usize,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputKind::Terminal)]
    pub output: OutputKind,

    /// Write logs to this file instead of stderr.
    #[clap(long)]
    pub log_file: Option<PathBuf>,
}

impl TryFrom<&Args> for TrackerConfig {
    type Error = TrackerError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let initial_ticker: Ticker = args.ticker.parse()?;
        TrackerConfig {
            initial_ticker,
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            refresh_interval: Duration::from_millis(args.refresh_interval_ms),
            history_capacity: args.history_capacity,
            queue_capacity: args.queue_capacity,
            ..TrackerConfig::default()
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_constants() {
        let args = Args::parse_from(["options_tracker"]);
        assert_eq!(args.source, SourceKind::Simulated);
        assert_eq!(args.output, OutputKind::Terminal);
        assert!(args.log_file.is_none());
        let config = TrackerConfig::try_from(&args).unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn flags_are_parsed_and_validated() {
        let args = Args::parse_from([
            "options_tracker",
            "--ticker",
            "aapl",
            "--source",
            "yahoo",
            "--seed",
            "42",
            "--poll-interval-secs",
            "2",
            "--output",
            "json",
        ]);
        assert_eq!(args.source.to_string(), "yahoo");
        assert_eq!(args.output.to_string(), "json");
        assert_eq!(args.seed, Some(42));
        let config = TrackerConfig::try_from(&args).unwrap();
        assert_eq!(config.initial_ticker.as_str(), "AAPL");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn bad_values_are_rejected() {
        let args = Args::parse_from(["options_tracker", "--ticker", "no good"]);
        assert!(matches!(TrackerConfig::try_from(&args), Err(TrackerError::InvalidTicker(_))));

        let args = Args::parse_from(["options_tracker", "--queue-capacity", "0"]);
        assert!(matches!(TrackerConfig::try_from(&args), Err(TrackerError::InvalidConfig(_))));
    }
}
