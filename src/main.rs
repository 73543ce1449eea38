//! Board game night status service entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use game_night::api::{create_router, AppState};
use game_night::config::Config;
use game_night::metrics;
use game_night::schedule::{Clock, SystemClock};
use game_night::status::report;
use game_night::utils::shutdown_signal;
use game_night::ServiceError;

/// Board game night status service.
#[derive(Parser, Debug)]
#[command(name = "game-night")]
#[command(about = "Reports whether board game night is on, and lets you cancel it")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print the current status page once.
    Next,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("game_night=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if args.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Next) => cmd_next(),
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration. Any error here aborts startup.
fn load_config() -> Result<Config, ServiceError> {
    let config = Config::load()?;
    config.validate()?;
    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("BOARD GAME NIGHT - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    let zone = config.event_zone()?;

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Authorization: <set, {} bytes>", config.authorization.len());
    println!("  Timezone: {}", zone);
    println!("  Production: {}", config.is_production());
    println!("  Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the status page for the current time.
fn cmd_next() -> anyhow::Result<()> {
    let config = load_config()?;
    let zone = config.event_zone()?;

    // A fresh process has never been cancelled.
    let report = report(zone, SystemClock.now(), false);
    print!("{}", report.text);
    if !report.text.ends_with('\n') {
        println!();
    }

    Ok(())
}

/// Serve the HTTP API until a shutdown signal arrives.
async fn cmd_serve(port: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config()?;
    let zone = config.event_zone()?;

    info!("Configuration loaded successfully");
    info!("Timezone: {}", zone);
    info!("Production: {}", config.is_production());

    // Install the Prometheus recorder before describing metrics
    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(ServiceError::from)?;
    metrics::init_metrics();

    let upkeep = prometheus.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            upkeep.run_upkeep();
        }
    });

    let state = AppState::new(config.authorization.as_str(), zone).with_prometheus(prometheus);
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));
    let listener = TcpListener::bind(addr).await.map_err(ServiceError::from)?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServiceError::from)?;

    info!("Server stopped");
    Ok(())
}
