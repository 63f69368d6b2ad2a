//! Market data feed for the options tracker.
//!
//! The tracker only talks to the [`MarketDataSource`] trait. Two implementations ship
//! with the crate:
//!
//! - `SimulatedSource`: a seeded random walk per ticker; works offline and can be
//!   told to fail individual calls.
//! - `YahooSource`: blocking HTTP against Yahoo Finance's chart and options endpoints.
//!
//! [`fetch_snapshot`] performs one poll cycle against any source and never fails:
//! each call's error is absorbed into "unavailable" values or empty collections.
#![warn(missing_docs)]
pub mod simulated;
pub mod source;
pub mod yahoo;

pub use simulated::SimulatedSource;
pub use source::{fetch_snapshot, MarketDataSource, SnapshotParts};
pub use yahoo::YahooSource;
