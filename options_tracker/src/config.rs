//! Runtime configuration of the tracker pipeline.
use std::time::Duration;

use options_common::config::{
    DISPLAY_WINDOW, HANDOFF_CAPACITY, HISTORY_CAPACITY, POLL_INTERVAL_SECS,
    REFRESH_INTERVAL_MS,
};
use options_common::model::HistoryLookback;
use options_common::{Result, Ticker, TrackerError};

/// Validated settings shared by the controller, the poller and the pump.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Ticker tracked at startup.
    pub initial_ticker: Ticker,
    /// Pause between two poll cycles.
    pub poll_interval: Duration,
    /// Display refresh period.
    pub refresh_interval: Duration,
    /// Maximum recorded prices.
    pub history_capacity: usize,
    /// Prices shown in the price-change table.
    pub display_window: usize,
    /// Snapshots buffered before the oldest is dropped.
    pub queue_capacity: usize,
    /// Chart history requested each cycle.
    pub lookback: HistoryLookback,
}

impl TrackerConfig {
    /// Reject zero intervals and capacities.
    pub fn validate(self) -> Result<Self> {
        let checks = [
            (self.poll_interval.is_zero(), "poll interval must be positive"),
            (self.refresh_interval.is_zero(), "refresh interval must be positive"),
            (self.history_capacity == 0, "history capacity must be at least 1"),
            (self.display_window == 0, "display window must be at least 1"),
            (self.queue_capacity == 0, "queue capacity must be at least 1"),
            (self.lookback.days == 0, "lookback must cover at least one day"),
            (self.lookback.interval_minutes == 0, "bar interval must be positive"),
        ];
        if let Some((_, message)) = checks.iter().find(|(failed, _)| *failed) {
            return Err(TrackerError::InvalidConfig((*message).to_string()));
        }
        Ok(self)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            initial_ticker: Ticker::default(),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            refresh_interval: Duration::from_millis(REFRESH_INTERVAL_MS),
            history_capacity: HISTORY_CAPACITY,
            display_window: DISPLAY_WINDOW,
            queue_capacity: HANDOFF_CAPACITY,
            lookback: HistoryLookback::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_constants() {
        let config = TrackerConfig::default().validate().unwrap();
        assert_eq!(config.initial_ticker.as_str(), "SPY");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.refresh_interval, Duration::from_millis(100));
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.display_window, 10);
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn zero_values_are_rejected() {
        let config = TrackerConfig {
            queue_capacity: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(config.validate(), Err(TrackerError::InvalidConfig(_))));

        let config = TrackerConfig {
            poll_interval: Duration::ZERO,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
