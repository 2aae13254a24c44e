//! Interaction Driver - Headless Control Loop for the Interaction Broker
//!
//! Runs a playback session with simulated producer modules and a console
//! interface, ticking the broker at the configured interval. Useful for
//! watching the dialog lifecycle end to end.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 2 producers, console interface, runs until Ctrl-C
//! interaction-driver
//!
//! # Stop after 50 ticks, one request per line as JSON
//! interaction-driver --ticks 50 --json
//!
//! # No interface attached: dialogs stay queued
//! interaction-driver --no-interface --ticks 20
//!
//! # Verbose logging
//! RUST_LOG=debug interaction-driver
//! ```

mod console;
mod producers;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use interaction_core::{
    load_config, load_config_from_path, Broker, ChannelInterface, ConfigOverrides,
    InterfaceCapabilities, InterfaceDirectory, InterfaceType, PlaybackSession,
};

/// Interaction Driver - drives the dialog broker with simulated modules
#[derive(Parser, Debug)]
#[command(name = "interaction-driver")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "INTERACTION_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Interval between manage ticks (milliseconds)
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// How long a question waits for an answer (milliseconds, 0 = forever)
    #[arg(long, value_name = "MS")]
    ask_timeout_ms: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Number of simulated producer modules
    #[arg(short = 'p', long, default_value_t = 2)]
    producers: usize,

    /// Do not attach the console interface
    #[arg(long)]
    no_interface: bool,

    /// Print interface requests as JSON lines
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "INTERACTION_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "interaction_driver={level},interaction_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Interaction driver starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(ms) = args.tick_ms {
        overrides = overrides.with_tick_interval_ms(ms);
    }
    if let Some(ms) = args.ask_timeout_ms {
        overrides = overrides.with_ask_timeout_ms(ms);
    }
    overrides
        .apply(&mut config)
        .context("Invalid command-line overrides")?;

    info!(
        source = %config.source(),
        tick_ms = config.broker.tick_interval_ms,
        ask_timeout_ms = config.broker.ask_timeout_ms,
        optimistic_hide = config.broker.optimistic_hide,
        "Configuration loaded"
    );

    let session = Arc::new(PlaybackSession::new("driver", config.broker.clone()));
    let broker = Broker::new(Arc::clone(&session), InterfaceDirectory::new());

    let renderer = if args.no_interface {
        info!("Running without an interface, dialogs will stay queued");
        None
    } else {
        let (interface, rx) = ChannelInterface::new(
            "console",
            InterfaceType::Tui,
            InterfaceCapabilities::tui(),
            64,
        );
        broker.directory().attach(Arc::new(interface));
        Some(tokio::spawn(console::run(rx, broker.clone(), args.json)))
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let workers = producers::spawn(
        &broker,
        args.producers,
        config.broker.tick_interval(),
        Arc::clone(&shutdown),
    );

    let mut interval = tokio::time::interval(config.broker.tick_interval());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = broker.manage();
                if let Err(e) = report.status() {
                    debug!(error = %e, pending = report.pending, "Tick skipped");
                }
                ticks += 1;
                if args.ticks.is_some_and(|max| ticks >= max) {
                    info!(ticks = ticks, "Tick limit reached");
                    break;
                }
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Received Ctrl-C, initiating shutdown");
                break;
            }
        }
    }

    // Shutdown: stop producers, wake blocked askers, drain threads
    shutdown.store(true, Ordering::SeqCst);
    if let Some(registry) = session.existing_registry() {
        let stats = registry.stats();
        info!(
            ticks = stats.ticks,
            deliveries = stats.deliveries,
            failures = stats.delivery_failures,
            destroyed = stats.dialogs_destroyed,
            pending = registry.len(),
            "Broker statistics"
        );
    }
    session.teardown();

    let summaries = tokio::task::spawn_blocking(move || producers::join(workers))
        .await
        .context("Producer threads panicked")?;
    for summary in &summaries {
        info!(
            producer = summary.index,
            submitted = summary.submitted,
            answered = summary.answered,
            failed = summary.failed,
            "Producer finished"
        );
    }

    if let Some(renderer) = renderer {
        renderer.abort();
    }

    info!("Interaction driver stopped cleanly");
    Ok(())
}
