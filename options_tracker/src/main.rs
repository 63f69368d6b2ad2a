//! Options Tracker. Polls a market data source for one ticker at a time and
//! shows the quote, the nearest option chain, recent price changes and an
//! hourly chart.
//!
//! Type a ticker and press Enter to switch; `:q`, `quit`, `exit`, Ctrl+C or
//! EOF end the program.
//!
//! Usage example (CLI):
//! ```bash
//! options_tracker --ticker AAPL --source yahoo --log-file tracker.log
//! options_tracker --seed 7 --output json | jq .banner
//! ```
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use log::{error, info};
use options_common::TrackerError;
use options_feed::{MarketDataSource, SimulatedSource, YahooSource};
use options_tracker::args::{Args, OutputKind, SourceKind};
use options_tracker::input::{spawn_stdin_reader, OperatorCommand};
use options_tracker::render::{DisplayRenderer, JsonRenderer, TerminalRenderer};
use options_tracker::{HandoffChannel, TickerSwitchController, TrackerConfig, UpdatePump};

fn main() -> Result<(), TrackerError> {
    let args = Args::parse();
    init_logger(args.log_file.as_deref())?;
    let config = TrackerConfig::try_from(&args)?;
    info!(
        "starting: ticker={} source={} output={}",
        config.initial_ticker, args.source, args.output
    );

    let source: Arc<dyn MarketDataSource> = match args.source {
        SourceKind::Simulated => match args.seed {
            Some(seed) => Arc::new(SimulatedSource::seeded(seed)),
            None => Arc::new(SimulatedSource::new()),
        },
        SourceKind::Yahoo => Arc::new(YahooSource::new()?),
    };

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down...");
        // A full buffer means a signal is already pending.
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| TrackerError::InvalidConfig(format!("cannot install Ctrl+C handler: {}", e)))?;

    let (cmd_tx, cmd_rx) = unbounded::<OperatorCommand>();
    spawn_stdin_reader(cmd_tx)?;

    let channel = Arc::new(HandoffChannel::new(config.queue_capacity)?);
    let mut controller = TickerSwitchController::new(source, channel, &config)?;
    controller.start(config.initial_ticker.clone())?;

    let renderer: Box<dyn DisplayRenderer> = match args.output {
        OutputKind::Terminal => Box::new(TerminalRenderer::new(io::stdout())),
        OutputKind::Json => Box::new(JsonRenderer::new(io::stdout())),
    };
    let pump = UpdatePump::new(renderer, config.display_window);
    match pump.run(&mut controller, cmd_rx, shutdown_rx, config.refresh_interval) {
        Ok(stats) => {
            info!("bye: {} snapshot(s) shown, {} discarded", stats.applied, stats.discarded);
            Ok(())
        }
        Err(e) => {
            error!("tracker stopped with an error: {}", e);
            Err(e)
        }
    }
}

/// Logs go to `log_file` at `Info` when given; otherwise only warnings reach
/// stderr so they do not scroll the dashboard away. `RUST_LOG` overrides both.
fn init_logger(log_file: Option<&Path>) -> Result<(), TrackerError> {
    let mut builder = env_logger::Builder::new();
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .filter_level(log::LevelFilter::Info)
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Warn);
        }
    }
    builder.parse_default_env().init();
    Ok(())
}
