//! Marga - maze run on the configured device
//!
//! Calibrates, explores, prints the raw and optimized routes, then replays.
//! The diagnostic stream goes to `[diagnostics] output`; logs go to stderr.

use clap::Parser;
use marga::control::Robot;
use marga::devices::create_device;
use marga::error::{Error, Result};
use marga::streaming::{open_output, DiagnosticWriter, Diagnostics};
use marga::{MargaConfig, Mission};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Line-following maze solver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when absent)
    #[arg(short, long, default_value = "marga.toml")]
    config: String,

    /// Maze file for the mock device
    #[arg(short, long)]
    maze: Option<String>,

    /// Explore/replay cycles after calibration
    #[arg(short, long)]
    attempts: Option<u32>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> Result<MargaConfig> {
    let mut config = if Path::new(&args.config).exists() {
        MargaConfig::load(&args.config)?
    } else {
        MargaConfig::default()
    };
    if let Some(maze) = &args.maze {
        config.device.simulation.maze_file = Some(maze.clone());
    }
    if let Some(attempts) = args.attempts {
        config.mission.attempts = attempts;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let env = env_logger::Env::default().default_filter_or(config.logging.level.as_str());
    env_logger::Builder::from_env(env).init();

    log::info!("Marga v{} starting...", env!("CARGO_PKG_VERSION"));
    if Path::new(&args.config).exists() {
        log::info!("Using config: {}", args.config);
    } else {
        log::info!("No {} found, using default configuration", args.config);
    }
    log::info!("Device: {}", config.device.device_type);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let (diagnostics, receiver) = Diagnostics::channel();
    let writer = DiagnosticWriter::spawn(receiver, open_output(&config.diagnostics.output)?)?;

    let mut device = create_device(&config)?;
    device.driver.initialize()?;
    let mut robot = Robot::new(device.driver, device.line).with_run_flag(running);

    let mission = Mission::new(config, diagnostics);
    let result = mission.run(&mut robot);
    if let Err(e) = robot.shutdown() {
        log::warn!("Device shutdown failed: {}", e);
    }
    drop(mission);
    let written = writer.join()?;
    log::debug!("{} diagnostic events written", written);

    let report = result?;
    for (i, attempt) in report.attempts.iter().enumerate() {
        log::info!(
            "Attempt {}: explored {} nodes, route {} -> {}, replayed {} nodes",
            i + 1,
            attempt.exploration.len(),
            attempt.raw,
            attempt.optimized,
            attempt.replay.len()
        );
    }
    log::info!("Marga finished");
    Ok(())
}
