//! tickbook - Binary Entry Point
//!
//! Replays a tick file through the venue with the support/resistance
//! strategy, streams per-tick snapshots to telemetry and prints the run
//! summary.
//!
//! ```bash
//! tickbook GBPUSD_ticks.csv --telemetry 127.0.0.1:8888 --perf-csv perf.csv
//! RUST_LOG=tickbook=trace tickbook GBPUSD_ticks.csv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tickbook::config::VenueConfig;
use tickbook::feed::TickReader;
use tickbook::perf::PerfMonitor;
use tickbook::strategy::SupportResistance;
use tickbook::telemetry::{LogSink, TelemetrySink, UdpSink};
use tickbook::venue::Venue;

#[derive(Debug, Parser)]
#[command(name = "tickbook", version, about = "Replay a tick file through a simulated venue")]
struct Args {
    /// CSV tick file: date,time,bid_price,ask_price,bid_volume,ask_volume
    ticks: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UDP address for per-tick snapshots (overrides the config)
    #[arg(short, long)]
    telemetry: Option<String>,

    /// Treat the first row of the tick file as a header
    #[arg(long)]
    headers: bool,

    /// Support level override
    #[arg(long)]
    support: Option<f64>,

    /// Resistance level override
    #[arg(long)]
    resistance: Option<f64>,

    /// Write per-operation timings to this CSV file
    #[arg(long)]
    perf_csv: Option<PathBuf>,

    /// Debug-level logging when RUST_LOG is unset
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = load_config(&args)?;

    let mut sink: Box<dyn TelemetrySink> = match &config.telemetry_addr {
        Some(addr) => Box::new(
            UdpSink::connect(addr).with_context(|| format!("connecting telemetry to {addr}"))?,
        ),
        None => Box::new(LogSink),
    };

    let mut reader = TickReader::from_path(&args.ticks, config.feed_has_headers)
        .with_context(|| format!("opening tick file {}", args.ticks.display()))?;

    let mut venue = Venue::new(&config).context("initializing venue")?;
    let mut strategy = SupportResistance::new(config.support, config.resistance);
    let mut perf = PerfMonitor::new();

    info!(file = %args.ticks.display(), "replay started");
    loop {
        let tick = match perf.time("read_tick", || reader.next_tick()) {
            Ok(Some(tick)) => tick,
            Ok(None) => break,
            Err(err) => {
                warn!(%err, "tick ingestion halted");
                break;
            }
        };

        let report = perf.time("process_tick", || venue.process_tick(&tick, &mut strategy));

        if let Err(err) = perf.time("publish", || sink.publish(&report.snapshot)) {
            warn!(tick = report.snapshot.tick, %err, "telemetry publish failed");
        }
    }

    let summary = venue.teardown();
    println!("{summary}");

    perf.summary();
    if let Some(path) = &args.perf_csv {
        perf.write_csv(path)
            .with_context(|| format!("writing perf report {}", path.display()))?;
        info!(path = %path.display(), "perf report written");
    }

    Ok(())
}

/// Config file (or defaults) with CLI overrides applied
fn load_config(args: &Args) -> Result<VenueConfig> {
    let mut config = match &args.config {
        Some(path) => VenueConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => VenueConfig::default(),
    };

    if let Some(addr) = &args.telemetry {
        config.telemetry_addr = Some(addr.clone());
    }
    if args.headers {
        config.feed_has_headers = true;
    }
    if let Some(support) = args.support {
        config.support = support;
    }
    if let Some(resistance) = args.resistance {
        config.resistance = resistance;
    }

    config.validate()?;
    Ok(config)
}
