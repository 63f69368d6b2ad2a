//! Tracker constants shared by the feed and the pipeline.

/// Seconds between two poll cycles of one session.
pub const POLL_INTERVAL_SECS: u64 = 5;
/// Milliseconds between two display refresh ticks.
pub const REFRESH_INTERVAL_MS: u64 = 100;
/// Maximum number of recorded prices kept in memory.
pub const HISTORY_CAPACITY: usize = 50;
/// Number of most recent prices shown in the price-change table.
pub const DISPLAY_WINDOW: usize = 10;
/// Calendar days of intraday bars fetched for the chart.
pub const HISTORY_LOOKBACK_DAYS: u32 = 5;
/// Width of one chart bar in minutes.
pub const HISTORY_INTERVAL_MINUTES: u32 = 60;
/// Pending snapshots buffered between poller and display before the oldest is dropped.
pub const HANDOFF_CAPACITY: usize = 16;
/// Ticker tracked at startup.
pub const DEFAULT_TICKER: &str = "SPY";
/// Prefix of every displayed currency value.
pub const CURRENCY_PREFIX: &str = "$";
/// `strftime` pattern of displayed timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// `strftime` pattern of chart x-axis labels.
pub const CHART_LABEL_FORMAT: &str = "%H:%M";
