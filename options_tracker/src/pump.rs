//! Display-side loop that moves snapshots from the handoff channel to the screen.
//!
//! Every refresh tick the pump drains the channel and applies the snapshots in
//! FIFO order. A snapshot from another ticker or an older generation is
//! discarded; an accepted one records its price and is rendered. Operator
//! commands and the shutdown signal are multiplexed on the same `select!`.
use std::time::Duration;

use crossbeam_channel::{never, select, tick, Receiver};
use log::{debug, error, info, warn};
use options_common::model::FetchResult;
use options_common::{Result, TrackerError};

use crate::controller::{SwitchOutcome, TickerSwitchController};
use crate::input::OperatorCommand;
use crate::render::{DashboardView, DisplayRenderer};

/// Counters kept across the pump's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Snapshots accepted and rendered (or attempted).
    pub applied: u64,
    /// Snapshots rejected as stale.
    pub discarded: u64,
    /// Render calls that returned an error.
    pub render_failures: u64,
}

pub struct UpdatePump<R: DisplayRenderer> {
    renderer: R,
    display_window: usize,
    stats: PumpStats,
}

impl<R: DisplayRenderer> UpdatePump<R> {
    /// `display_window` is the number of recent prices handed to the renderer.
    pub fn new(renderer: R, display_window: usize) -> Self {
        UpdatePump {
            renderer,
            display_window,
            stats: PumpStats::default(),
        }
    }

    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Drain the channel and apply everything that belongs to the running
    /// session. Returns the number of applied snapshots.
    pub fn apply_pending(&mut self, controller: &mut TickerSwitchController) -> Result<usize> {
        let pending = controller.channel().drain_all()?;
        let mut applied = 0;
        for result in pending {
            if !controller.accepts(&result) {
                self.stats.discarded += 1;
                debug!(
                    "discarding stale snapshot {} {} (tracking {:?} {})",
                    result.ticker,
                    result.generation,
                    controller.ticker().map(|t| t.as_str()),
                    controller.generation()
                );
                continue;
            }
            self.apply(controller, &result);
            applied += 1;
        }
        Ok(applied)
    }

    fn apply(&mut self, controller: &mut TickerSwitchController, result: &FetchResult) {
        // Only a fully populated quote goes into the price log.
        if result.quote.is_complete() {
            if let Some(price) = result.quote.current_price.value() {
                match controller.history_mut().record(result.fetched_at, price) {
                    Ok(entry) => debug!("{} recorded {:.2} ({:+.2})", result.ticker, entry.price, entry.change),
                    Err(TrackerError::OutOfOrder(reason)) => {
                        debug!("{} price not recorded: {}", result.ticker, reason)
                    }
                    Err(e) => warn!("{} price not recorded: {}", result.ticker, e),
                }
            }
        }

        let view = DashboardView {
            ticker: &result.ticker,
            generation: result.generation,
            fetched_at: result.fetched_at,
            quote: &result.quote,
            expiration: result.chain.expiration.as_deref(),
            calls: &result.chain.calls,
            puts: &result.chain.puts,
            summary: &result.chain.summary,
            recent_prices: controller.history().last_n(self.display_window),
            history: &result.history,
        };
        self.stats.applied += 1;
        if let Err(e) = self.renderer.render(&view) {
            self.stats.render_failures += 1;
            error!("render failed for {} {}: {}", result.ticker, result.generation, e);
        }
    }

    fn handle_switch(&mut self, controller: &mut TickerSwitchController, raw: &str) {
        match controller.switch_to(raw) {
            Ok(SwitchOutcome::Started { ticker, generation }) => {
                info!("started {} {}", ticker, generation)
            }
            Ok(SwitchOutcome::Switched { from, to, generation }) => {
                info!("operator switched {} -> {} {}", from, to, generation)
            }
            Ok(SwitchOutcome::Unchanged) | Ok(SwitchOutcome::Empty) => {}
            Err(TrackerError::InvalidTicker(input)) => warn!("ignoring invalid ticker {:?}", input),
            Err(e) => error!("switch to {:?} failed: {}", raw, e),
        }
    }

    /// Run until the operator quits or `shutdown` fires (message or disconnect).
    ///
    /// On exit the controller is shut down before the renderer is torn down, so
    /// nothing is applied after teardown starts. A disconnected `commands`
    /// channel is ignored; the pump keeps running until `shutdown`.
    pub fn run(
        mut self,
        controller: &mut TickerSwitchController,
        commands: Receiver<OperatorCommand>,
        shutdown: Receiver<()>,
        refresh: Duration,
    ) -> Result<PumpStats> {
        let ticker = tick(refresh);
        let mut commands_open = true;
        let mut outcome = Ok(());

        loop {
            let pending_commands = if commands_open { commands.clone() } else { never() };
            select! {
                recv(ticker) -> _ => {
                    if let Err(e) = self.apply_pending(controller) {
                        error!("update pump failed: {}", e);
                        outcome = Err(e);
                        break;
                    }
                },
                recv(pending_commands) -> msg => match msg {
                    Ok(OperatorCommand::SwitchTicker(raw)) => self.handle_switch(controller, &raw),
                    Ok(OperatorCommand::Quit) => {
                        info!("quit requested");
                        break;
                    }
                    Err(_) => {
                        debug!("command channel closed");
                        commands_open = false;
                    }
                },
                recv(shutdown) -> _ => {
                    info!("shutdown signal received");
                    break;
                },
            }
        }

        controller.shutdown()?;
        self.renderer.teardown()?;
        info!(
            "update pump stopped: {} applied, {} discarded, {} render failure(s)",
            self.stats.applied, self.stats.discarded, self.stats.render_failures
        );
        outcome.map(|()| self.stats)
    }
}
