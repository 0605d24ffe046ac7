//! Server command handlers
//!
//! Talks to the transfer server with the saved credentials.

use anyhow::{Context, Result};
use colored::*;
use easytransfer_client::TransferClient;
use easytransfer_core::settings::SettingsStore;

use crate::config::Config;

/// Build a client from the saved settings
fn client(config: &Config) -> Result<TransferClient> {
    let settings = config.store().load()?;

    let server_url = settings
        .server_url
        .filter(|s| !s.trim().is_empty())
        .context("No server URL saved; run `easytransfer configure` first")?;
    let token = settings
        .api_token
        .filter(|s| !s.trim().is_empty())
        .context("No API token saved; run `easytransfer configure` first")?;

    Ok(TransferClient::new(server_url, token))
}

/// Check connectivity and token validity
pub async fn ping(config: &Config) -> Result<()> {
    let client = client(config)?;

    match client.ping_auth().await {
        Ok(true) => {
            println!("{} Connected to {}", "✓".green(), client.base_url().cyan());
            Ok(())
        }
        Ok(false) => anyhow::bail!("Server answered, but not with pong"),
        Err(e) if e.is_unauthorized() => anyhow::bail!("Server rejected the API token"),
        Err(e) => Err(e).context("Connection check failed"),
    }
}

/// Show a request's server-side status
pub async fn status(config: &Config, request_id: i64) -> Result<()> {
    let client = client(config)?;

    let request = match client.get_request_status(request_id).await {
        Ok(request) => request,
        Err(e) if e.is_not_found() => {
            println!("{}", format!("Request {} not found.", request_id).yellow());
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to fetch request status"),
    };

    println!("  {} Request {}", "▸".cyan(), request.request_id.to_string().bold());
    println!("    Status:  {}", colorize_status(&request.status));
    println!("    Phone:   {}", request.phone_number);
    println!("    Amount:  {}", request.amount);

    Ok(())
}

/// Colorize a request status for display
fn colorize_status(status: &str) -> ColoredString {
    match status {
        "Success" | "Done" => status.green(),
        "Failed" => status.red(),
        _ => status.yellow(),
    }
}
