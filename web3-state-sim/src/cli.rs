use clap::{Parser, Subcommand};

/// The main CLI structure for the web3-state simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario against a fresh connection store.
    Run(RunCmd),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to the scenario TOML file.
    /// If not provided, a single activation with default settings is replayed.
    #[arg(short, long)]
    pub config: Option<String>,
}
