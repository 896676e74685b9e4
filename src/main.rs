use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use sumo_demo::config::{
    DriverConfig, EngineOptions, DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILTER, DEFAULT_SUMO_BINARY,
};
use sumo_demo::driver::SimulationDriver;
use sumo_demo::telemetry::LogSink;
use sumo_demo::traci::TraciEngine;

#[derive(Parser)]
#[command(name = "sumo_demo")]
#[command(about = "Step a SUMO simulation and log vehicle telemetry")]
struct Cli {
    /// Simulation configuration
    #[arg(long = "config_file", default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Number of steps
    #[arg(long = "num_steps", default_value_t = 0)]
    num_steps: u64,

    /// SUMO executable; a bare name is looked up under $SUMO_HOME/bin first
    #[arg(long = "sumo_binary", env = "SUMO_BINARY", default_value = DEFAULT_SUMO_BINARY)]
    sumo_binary: PathBuf,

    /// TraCI port for the engine, 0 picks a free one
    #[arg(long = "remote_port", default_value_t = 0)]
    remote_port: u16,

    /// Log filter, overridden by RUST_LOG when set
    #[arg(long = "log_filter", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,

    /// SUMO installation root
    #[arg(long = "sumo_home", env = "SUMO_HOME", hide = true)]
    sumo_home: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env = env_logger::Env::default().default_filter_or(cli.log_filter.as_str());
    env_logger::Builder::from_env(env).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = DriverConfig::new(cli.config_file, cli.num_steps);
    let options = EngineOptions::new(&cli.sumo_binary, cli.remote_port, cli.sumo_home.as_deref())?;

    let engine = TraciEngine::new(options.sumo_binary).with_port(options.remote_port);
    let mut sink = LogSink;

    let mut driver = SimulationDriver::initialize(engine, &config.config_file)
        .with_context(|| {
            format!(
                "failed to load simulation configuration {}",
                config.config_file.display()
            )
        })?;
    driver
        .register_telemetry()
        .context("failed to subscribe to arrived vehicles")?;
    driver
        .run_loop(config.num_steps, &mut sink)
        .with_context(|| format!("simulation failed after {} steps", driver.steps_taken()))?;

    info!("Completed {} steps", driver.steps_taken());
    Ok(())
}
