//! Live quote and option chain tracker.
//!
//! The pipeline has two sides joined by a bounded [`handoff::HandoffChannel`]:
//!
//! - `poller`: a background session per `(ticker, generation)` that fetches a
//!   snapshot every poll interval and pushes it onto the channel.
//! - `pump`: the display loop. It drains the channel every refresh tick, discards
//!   stale snapshots, records prices in `history` and hands a view to a `render`er.
//!
//! `controller` owns the session lifecycle and the ticker switch protocol;
//! `input` turns stdin lines into operator commands; `args` and `config` carry
//! the runtime settings.
pub mod args;
pub mod config;
pub mod controller;
pub mod handoff;
pub mod history;
pub mod input;
pub mod poller;
pub mod pump;
pub mod render;

pub use config::TrackerConfig;
pub use controller::{ControllerState, SwitchOutcome, TickerSwitchController};
pub use handoff::HandoffChannel;
pub use history::PriceHistoryTracker;
pub use input::OperatorCommand;
pub use pump::{PumpStats, UpdatePump};
pub use render::{DashboardView, DisplayRenderer};
