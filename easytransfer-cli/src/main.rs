//! EasyTransfer CLI
//!
//! Command-line settings tool for the EasyTransfer runner: stores the server
//! address, API token and transfer password the runner reads, and checks them
//! against the server.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "easytransfer")]
#[command(about = "EasyTransfer runner settings CLI", long_about = None)]
struct Cli {
    /// Settings file shared with the runner
    #[arg(long, env = "EASYTRANSFER_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::new(cli.settings);

    handle_command(cli.command, &config).await
}
