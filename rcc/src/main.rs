//! # Ride Control Computer Binary
//!
//! Process bootstrap: CLI parsing, tracing setup, serial link bring-up,
//! signal handling, and the supervisor loop.
//!
//! # Usage
//!
//! ```bash
//! # Run with the default configuration file
//! rcc --config config/ride.toml
//!
//! # Override the serial device and log verbosely
//! rcc -c config/ride.toml -p /dev/ttyUSB0 -v
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rcc::panel::IdlePanelSource;
use rcc::show::LoggingShowController;
use rcc::supervisor::RideSupervisor;
use rcc_common::config::RideConfig;
use rcc_common::motor::MotorService;
use rcc_common::panel::panel_channel;
use rcc_common::show::ShowController;
use rcc_common::timing::ShutdownSignal;
use rcc_motion::SerialMotorService;
use rcc_roboclaw::RoboClaw;

/// Ride control computer
#[derive(Parser, Debug)]
#[command(name = "rcc")]
#[command(version)]
#[command(about = "Supervisory control core for the ride")]
struct Args {
    /// Path to the ride configuration file
    #[arg(short, long, default_value = "config/ride.toml")]
    config: PathBuf,

    /// Override the serial device from the configuration
    #[arg(short, long)]
    port: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("rcc startup failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = RideConfig::load(&args.config)?;
    setup_tracing(&args, &config);

    info!("Ride control computer v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut serial = config.serial.clone();
    if let Some(port) = args.port {
        serial.port = port;
    }

    let claw = RoboClaw::open(&serial)?;
    let motor: Arc<dyn MotorService> = Arc::new(SerialMotorService::new(claw));
    let show: Arc<dyn ShowController> = Arc::new(LoggingShowController::new());

    let shutdown = ShutdownSignal::new();
    let handler_shutdown = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_shutdown.signal();
    })?;

    let (panel_tx, panel_rx) = panel_channel();
    let mut supervisor = RideSupervisor::new(motor, show, panel_rx, shutdown)
        .with_telemetry_period(Duration::from_secs_f64(config.supervisor.telemetry_period_s));

    supervisor.run(Box::new(IdlePanelSource), panel_tx)?;

    info!("Ride control computer shutdown complete");
    Ok(())
}

/// Setup the tracing subscriber from CLI arguments and configuration.
fn setup_tracing(args: &Args, config: &RideConfig) {
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level.as_tracing()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
