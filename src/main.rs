//! Starlink Exporter Binary
//!
//! Serves Starlink dish telemetry as Prometheus metrics, or dumps a single
//! reading of the dish to the terminal.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use starlink_exporter::config::{
    parse_log_level, DEFAULT_DISH_ADDRESS, DEFAULT_INTERVAL, DEFAULT_LISTEN_ADDRESS,
    DEFAULT_LOG_LEVEL,
};
use starlink_exporter::dish::Timeouts;
use starlink_exporter::{
    exporter, DeviceInfo, DishClient, ExporterConfig, GrpcDishClient, HistoryWindow,
    StatusSnapshot,
};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "starlink_exporter")]
#[command(about = "Prometheus exporter for Starlink dish telemetry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// IP and port of the dish gRPC endpoint
    #[arg(long, env = "STARLINK_DISH", default_value = DEFAULT_DISH_ADDRESS, global = true)]
    dish: String,

    /// Update interval, e.g. 30s or 1m
    #[arg(short, long, env = "STARLINK_INTERVAL", default_value = DEFAULT_INTERVAL, global = true)]
    interval: String,

    /// Address to serve metrics on
    #[arg(long, env = "STARLINK_LISTEN", default_value = DEFAULT_LISTEN_ADDRESS, global = true)]
    listen: String,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, env = "STARLINK_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL, global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the exporter (default)
    Serve,

    /// Query the dish once and print what it reports
    Dump(DumpArgs),
}

#[derive(Args)]
struct DumpArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// Number of most recent outages to print
    #[arg(long, default_value_t = 5)]
    outages: usize,
}

#[derive(Serialize)]
struct Dump {
    info: DeviceInfo,
    status: StatusSnapshot,
    history: HistoryWindow,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing/logging
    if let Err(err) = init_logging(&cli.log_level) {
        eprintln!("{:#}", err);
        return ExitCode::FAILURE;
    }

    let result = match &cli.command {
        Some(Commands::Dump(args)) => dump_command(&cli, args).await,
        Some(Commands::Serve) | None => serve_command(&cli).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = parse_log_level(level);
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;

    Ok(())
}

async fn serve_command(cli: &Cli) -> anyhow::Result<()> {
    let config = ExporterConfig::from_args(&cli.dish, &cli.interval, &cli.listen)?;

    info!("Starting Starlink exporter...");
    info!("  - Dish endpoint: {}", config.dish);
    info!("  - Update interval: {}", humantime::format_duration(config.interval));
    info!("  - Metrics address: http://{}/metrics", config.listen);

    exporter::run(config, shutdown_signal())
        .await
        .context("Exporter failed")?;

    Ok(())
}

async fn dump_command(cli: &Cli, args: &DumpArgs) -> anyhow::Result<()> {
    let mut dish = GrpcDishClient::connect(&cli.dish, Timeouts::default()).await?;

    let dump = Dump {
        info: dish.device_info().await?,
        status: dish.status().await?,
        history: dish.history().await?,
    };

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&dump)?;
            println!("{}", json);
        }
        "pretty" => print_pretty_dump(&dump, args.outages),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_dump(dump: &Dump, outages: usize) {
    let identity = &dump.info.identity;
    println!("Dish {}", identity.id);
    println!("==========================================");
    println!("  Hardware: {}", identity.hardware_version);
    println!("  Software: {}", identity.software_version);
    println!("  Country: {}", identity.country_code);
    println!("  Boot count: {}", dump.info.bootcount);
    println!();

    let status = &dump.status;
    println!("Status:");
    println!("  Uptime: {}s", status.uptime_s);
    println!(
        "  GPS: {} ({} sats)",
        if status.gps_valid { "valid" } else { "invalid" },
        status.gps_sats
    );
    println!(
        "  Obstructed: {} ({:.1}% of sky)",
        status.currently_obstructed,
        status.fraction_obstructed * 100.0
    );
    println!("  Ping drop rate: {:.3}", status.pop_ping_drop_rate);
    println!("  Ping latency: {:.1} ms", status.pop_ping_latency_ms);
    println!(
        "  Throughput: {:.0} bps down / {:.0} bps up",
        status.downlink_throughput_bps, status.uplink_throughput_bps
    );
    println!(
        "  Pointing: azimuth {:.1}°, elevation {:.1}°",
        status.boresight_azimuth_deg, status.boresight_elevation_deg
    );
    if let Some(outage) = &status.outage {
        println!("  Outage: {} since {}", outage.cause, outage.started_at());
    }
    if status.alerts.any() {
        let raised: Vec<_> = status
            .alerts
            .iter()
            .filter(|(_, raised)| *raised)
            .map(|(name, _)| name)
            .collect();
        println!("  Alerts: {}", raised.join(", "));
    } else {
        println!("  Alerts: none");
    }
    println!();

    println!("Last {} outages:", outages);
    for outage in dump.history.outages.iter().rev().take(outages) {
        let local = outage.started_at().with_timezone(&chrono::Local);
        println!(
            "  Outage @ {} [{:.1}s]\tswitched:{} cause:{}",
            local.format("%H:%M:%S %Z"),
            outage.duration_secs(),
            outage.did_switch,
            outage.cause
        );
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
