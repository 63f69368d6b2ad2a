//! Ticker switch protocol and ownership of the polling session.
//!
//! The controller is the single owner of "which ticker, which generation". It
//! lives on the display thread next to the update pump, which is why the price
//! history it owns needs no lock: resets happen between two drains.
//!
//! Switching to a new ticker:
//! 1. stop the current poller session (cooperative, takes effect after its cycle);
//! 2. clear the handoff channel and reset the price history;
//! 3. bump the generation and adopt the new ticker;
//! 4. spawn a new poller session for `(ticker, generation)`;
//! 5. spawn one immediate fetch so the display does not wait a full interval.
//!
//! A straggler pushed by the old session after step 2 carries the old
//! generation and is rejected by [`TickerSwitchController::accepts`].
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use options_common::model::{FetchResult, Generation, HistoryLookback};
use options_common::{Result, Ticker, TrackerError};
use options_feed::MarketDataSource;
use strum_macros::Display;

use crate::config::TrackerConfig;
use crate::handoff::HandoffChannel;
use crate::history::PriceHistoryTracker;
use crate::poller::{self, PollerHandle, PollerSession};

/// Lifecycle of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ControllerState {
    /// Created, nothing polled yet.
    Idle,
    /// A session is polling the current ticker.
    Running,
    /// Between stopping the old session and starting the new one.
    Switching,
    /// Shut down; nothing is accepted any more.
    Stopped,
}

/// What a start or switch request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// First session started.
    Started {
        /// Tracked ticker.
        ticker: Ticker,
        /// Its generation.
        generation: Generation,
    },
    /// Moved to another ticker.
    Switched {
        /// Ticker tracked before.
        from: Ticker,
        /// Ticker tracked now.
        to: Ticker,
        /// Generation of the new session.
        generation: Generation,
    },
    /// Input named the ticker already tracked.
    Unchanged,
    /// Input was blank.
    Empty,
}

/// Owner of the polling session, the handoff channel handle and the price history.
pub struct TickerSwitchController {
    state: ControllerState,
    ticker: Option<Ticker>,
    generation: Generation,
    history: PriceHistoryTracker,
    channel: Arc<HandoffChannel>,
    source: Arc<dyn MarketDataSource>,
    poller: Option<PollerHandle>,
    poll_interval: Duration,
    lookback: HistoryLookback,
}

impl TickerSwitchController {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        channel: Arc<HandoffChannel>,
        config: &TrackerConfig,
    ) -> Result<Self> {
        Ok(TickerSwitchController {
            state: ControllerState::Idle,
            ticker: None,
            generation: Generation::default(),
            history: PriceHistoryTracker::new(config.history_capacity)?,
            channel,
            source,
            poller: None,
            poll_interval: config.poll_interval,
            lookback: config.lookback,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Ticker of the current session, if any.
    pub fn ticker(&self) -> Option<&Ticker> {
        self.ticker.as_ref()
    }

    /// Generation of the current session; 0 before the first start.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn history(&self) -> &PriceHistoryTracker {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut PriceHistoryTracker {
        &mut self.history
    }

    pub fn channel(&self) -> &Arc<HandoffChannel> {
        &self.channel
    }

    /// Start polling `ticker`. From any state other than `Idle` this behaves like a switch.
    pub fn start(&mut self, ticker: Ticker) -> Result<SwitchOutcome> {
        match self.state {
            ControllerState::Idle => {
                self.generation = Generation::FIRST;
                self.ticker = Some(ticker.clone());
                self.poller = Some(self.spawn_session(ticker.clone(), false)?);
                self.state = ControllerState::Running;
                info!("tracking {} {}", ticker, self.generation);
                Ok(SwitchOutcome::Started {
                    ticker,
                    generation: self.generation,
                })
            }
            _ => self.switch_to(ticker.as_str()),
        }
    }

    /// Handle a ticker submitted by the operator.
    ///
    /// Blank input and the current ticker are no-ops; an invalid symbol is an
    /// error and leaves everything untouched.
    pub fn switch_to(&mut self, raw: &str) -> Result<SwitchOutcome> {
        if self.state == ControllerState::Stopped {
            return Err(TrackerError::Format("controller is stopped".to_string()));
        }
        if raw.trim().is_empty() {
            return Ok(SwitchOutcome::Empty);
        }
        let ticker: Ticker = raw.parse()?;
        if self.state == ControllerState::Idle {
            return self.start(ticker);
        }
        if self.ticker.as_ref() == Some(&ticker) {
            debug!("{} already tracked, ignoring", ticker);
            return Ok(SwitchOutcome::Unchanged);
        }

        self.state = ControllerState::Switching;
        if let Some(mut old) = self.poller.take() {
            old.stop();
        }
        let discarded = self.channel.clear()?;
        self.history.reset();

        let from = self.ticker.replace(ticker.clone()).unwrap_or_default();
        self.generation = self.generation.next();
        self.poller = Some(self.spawn_session(ticker.clone(), true)?);
        poller::spawn_immediate_fetch(
            Arc::clone(&self.source),
            Arc::clone(&self.channel),
            ticker.clone(),
            self.generation,
            self.lookback,
        )?;
        self.state = ControllerState::Running;

        info!(
            "switched {} -> {} {} ({} queued snapshot(s) discarded)",
            from, ticker, self.generation, discarded
        );
        Ok(SwitchOutcome::Switched {
            from,
            to: ticker,
            generation: self.generation,
        })
    }

    /// `true` when `result` belongs to the running session and may be applied.
    pub fn accepts(&self, result: &FetchResult) -> bool {
        self.state == ControllerState::Running
            && self
                .ticker
                .as_ref()
                .is_some_and(|ticker| result.belongs_to(ticker, self.generation))
    }

    /// Stop polling and refuse further snapshots. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == ControllerState::Stopped {
            return Ok(());
        }
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        self.state = ControllerState::Stopped;
        let discarded = self.channel.clear()?;
        info!("controller stopped ({} queued snapshot(s) discarded)", discarded);
        Ok(())
    }

    /// Like [`shutdown`](Self::shutdown), then wait for the poller thread to exit.
    pub fn shutdown_and_join(&mut self) -> Result<()> {
        let poller = self.poller.take();
        self.shutdown()?;
        match poller {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }

    fn spawn_session(&self, ticker: Ticker, delay_first_cycle: bool) -> Result<PollerHandle> {
        poller::spawn(PollerSession {
            ticker,
            generation: self.generation,
            source: Arc::clone(&self.source),
            channel: Arc::clone(&self.channel),
            interval: self.poll_interval,
            lookback: self.lookback,
            delay_first_cycle,
        })
    }
}

impl Drop for TickerSwitchController {
    fn drop(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }
}
