//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod server;
mod settings;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Save server address, API token and transfer password
    Configure {
        /// Server base URL (e.g., https://transfer.example.com)
        #[arg(long)]
        server_url: Option<String>,

        /// API token
        #[arg(long, env = "EASYTRANSFER_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Carrier transfer password
        #[arg(long, env = "EASYTRANSFER_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Save without checking the server first
        #[arg(long)]
        skip_check: bool,
    },
    /// Show the saved settings (secrets masked)
    Show,
    /// Remove the saved settings
    Clear,
    /// Check that the server accepts the saved token
    Ping,
    /// Show the server-side status of a transfer request
    Status {
        /// Request ID
        request_id: i64,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Configure {
            server_url,
            token,
            password,
            skip_check,
        } => {
            let update = settings::SettingsUpdate {
                server_url,
                token,
                password,
            };
            settings::configure(config, update, skip_check).await
        }
        Commands::Show => settings::show(config),
        Commands::Clear => settings::clear(config),
        Commands::Ping => server::ping(config).await,
        Commands::Status { request_id } => server::status(config, request_id).await,
    }
}
