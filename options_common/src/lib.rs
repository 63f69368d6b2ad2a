//!
//! Common types and utilities shared by the market data feed and the tracker.
//!
//! This crate aggregates:
//! - `error`: unified error type `TrackerError` used across the workspace.
//! - `result`: handy `Result<T, TrackerError>` alias.
//! - `ticker`: ticker symbols and operator input normalization.
//! - `model`: quotes, option chains, history bars and poll snapshots.
//! - `config`: polling, refresh and retention constants.
//! - `format`: currency, timestamp and summary formatting for display.
#![warn(missing_docs)]
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod result;
pub mod ticker;

pub use error::TrackerError;
pub use result::Result;
pub use ticker::Ticker;
