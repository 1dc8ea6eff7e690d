pub mod cli;
pub mod config;
pub mod scenario;

use anyhow::Result;
use clap::Parser;
use crate::cli::{Cli, Commands};
use crate::config::{load_config, SimConfig};

/// The main entry point for the simulator.
/// This function handles CLI parsing, configuration, and the scenario replay.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Run(run_cmd) = cli.command;
    let config = load_config_from_cli(run_cmd)?;
    web3_state_logger::init(&config.log)?;
    tracing::debug!("Configuration loaded: {:#?}", &config);

    let reports = scenario::run_scenario(&config).await?;
    tracing::info!("Scenario finished after {} step(s)", reports.len());

    Ok(())
}

/// Loads the scenario based on the provided CLI command.
fn load_config_from_cli(run_cmd: cli::RunCmd) -> Result<SimConfig> {
    if let Some(config_path) = run_cmd.config {
        println!("Loading scenario from '{}'", &config_path);
        load_config(&config_path)
    } else {
        println!("No scenario file provided, using default settings.");
        Ok(SimConfig::default())
    }
}
