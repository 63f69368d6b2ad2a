//! Background polling sessions.
//!
//! A session is bound to one `(ticker, generation)` pair and owns one thread.
//! Every cycle runs the three provider calls, pushes the snapshot onto the
//! handoff channel and then waits for the poll interval. Stopping is
//! cooperative: the `SessionToken` is checked between cycles only, so an
//! in-flight fetch always completes; its result may still reach the channel
//! and is discarded downstream by the generation check.
//!
//! The one-shot immediate fetch issued on a ticker switch lives here too.
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, error, info};
use options_common::model::{Generation, HistoryLookback};
use options_common::{Result, Ticker, TrackerError};
use options_feed::{fetch_snapshot, MarketDataSource};

use crate::handoff::HandoffChannel;

/// Stop signal observed by a session thread.
///
/// The session is active until its paired `Sender` is dropped; the disconnect
/// is sticky, so every later check also reports the stop.
#[derive(Debug, Clone)]
pub struct SessionToken {
    stop_rx: Receiver<()>,
}

impl SessionToken {
    fn pair() -> (Sender<()>, SessionToken) {
        let (stop_tx, stop_rx) = bounded(0);
        (stop_tx, SessionToken { stop_rx })
    }

    /// `true` until the session is stopped.
    pub fn is_active(&self) -> bool {
        matches!(self.stop_rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleep up to `interval`; returns early with `false` once the session is stopped.
    pub fn wait(&self, interval: Duration) -> bool {
        matches!(
            self.stop_rx.recv_timeout(interval),
            Err(RecvTimeoutError::Timeout)
        )
    }
}

/// Everything a polling session needs.
#[derive(Clone)]
pub struct PollerSession {
    /// Ticker polled by this session.
    pub ticker: Ticker,
    /// Generation stamped on every snapshot.
    pub generation: Generation,
    /// Provider queried each cycle.
    pub source: Arc<dyn MarketDataSource>,
    /// Destination of the snapshots.
    pub channel: Arc<HandoffChannel>,
    /// Pause between cycles.
    pub interval: Duration,
    /// History window requested each cycle.
    pub lookback: HistoryLookback,
    /// Wait one interval before the first cycle.
    pub delay_first_cycle: bool,
}

/// Owner side of a running session. Dropping it stops the session without joining.
pub struct PollerHandle {
    ticker: Ticker,
    generation: Generation,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Signal the session to stop after its current cycle. Idempotent.
    pub fn stop(&mut self) {
        if self.stop_tx.take().is_some() {
            debug!("poller {} {} asked to stop", self.ticker, self.generation);
        }
    }

    /// Stop and wait for the thread; blocks for at most one in-flight cycle.
    pub fn join(mut self) -> Result<()> {
        self.stop();
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| TrackerError::Format(format!("poller {} panicked", self.generation))),
            None => Ok(()),
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the session thread.
pub fn spawn(session: PollerSession) -> Result<PollerHandle> {
    let (stop_tx, token) = SessionToken::pair();
    let ticker = session.ticker.clone();
    let generation = session.generation;
    let thread = thread::Builder::new()
        .name(format!("poller-{}-{}", ticker, generation.get()))
        .spawn(move || {
            if let Err(e) = run_session(&session, &token) {
                error!("poller {} {} failed: {}", session.ticker, session.generation, e);
            }
        })?;

    Ok(PollerHandle {
        ticker,
        generation,
        stop_tx: Some(stop_tx),
        thread: Some(thread),
    })
}

/// Session loop: fetch, push, wait, until the token reports a stop.
fn run_session(session: &PollerSession, token: &SessionToken) -> Result<()> {
    info!(
        "poller started for {} {} (every {:?})",
        session.ticker, session.generation, session.interval
    );
    if session.delay_first_cycle && !token.wait(session.interval) {
        info!("poller {} {} stopped before first cycle", session.ticker, session.generation);
        return Ok(());
    }

    let mut cycles: u64 = 0;
    while token.is_active() {
        let result = fetch_snapshot(
            session.source.as_ref(),
            &session.ticker,
            session.generation,
            session.lookback,
        );
        if !token.is_active() {
            debug!("poller {} {} stopped mid-cycle, dropping snapshot", session.ticker, session.generation);
            break;
        }
        let dropped = session.channel.push(result)?;
        if dropped > 0 {
            debug!("handoff dropped {} stale snapshot(s)", dropped);
        }
        cycles += 1;

        if !token.wait(session.interval) {
            break;
        }
    }

    info!(
        "poller stopped for {} {} after {} cycle(s)",
        session.ticker, session.generation, cycles
    );
    Ok(())
}

/// Fetch once on a short-lived thread and push the snapshot for `generation`.
pub fn spawn_immediate_fetch(
    source: Arc<dyn MarketDataSource>,
    channel: Arc<HandoffChannel>,
    ticker: Ticker,
    generation: Generation,
    lookback: HistoryLookback,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("fetch-{}-{}", ticker, generation.get()))
        .spawn(move || {
            let result = fetch_snapshot(source.as_ref(), &ticker, generation, lookback);
            match channel.push(result) {
                Ok(_) => debug!("immediate fetch for {} {} queued", ticker, generation),
                Err(e) => error!("immediate fetch for {} {} lost: {}", ticker, generation, e),
            }
        })?;
    Ok(handle)
}
