//! Settings command handlers
//!
//! Writes and inspects the settings file the runner reads every poll cycle.

use anyhow::{Context, Result};
use colored::*;
use easytransfer_client::TransferClient;
use easytransfer_core::settings::{Settings, SettingsStore};

use crate::config::Config;

/// Values given on the command line; `None` keeps the saved value
#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub password: Option<String>,
}

impl SettingsUpdate {
    /// Applies the update on top of the saved settings
    pub fn apply(self, mut settings: Settings) -> Settings {
        let clean = |v: String| v.trim().to_string();

        if let Some(server_url) = self.server_url {
            settings.server_url = Some(clean(server_url).trim_end_matches('/').to_string());
        }
        if let Some(token) = self.token {
            settings.api_token = Some(clean(token));
        }
        if let Some(password) = self.password {
            settings.password = Some(clean(password));
        }
        settings
    }
}

/// Save settings, checking the server first unless told not to
pub async fn configure(config: &Config, update: SettingsUpdate, skip_check: bool) -> Result<()> {
    let store = config.store();
    let settings = update.apply(store.load()?);

    if !skip_check {
        let (Some(server_url), Some(token)) = (
            settings.server_url.as_deref().filter(|s| !s.is_empty()),
            settings.api_token.as_deref().filter(|s| !s.is_empty()),
        ) else {
            anyhow::bail!("server URL and API token are required to check the connection");
        };

        println!("Checking {}...", server_url.cyan());
        let pong = TransferClient::new(server_url, token)
            .ping_auth()
            .await
            .context("Connection check failed")?;
        if !pong {
            anyhow::bail!("Server did not answer the connection check with pong");
        }
    }

    store.save(&settings)?;
    println!(
        "{} Settings saved to {}",
        "✓".green(),
        config.settings_path.display()
    );

    let missing = settings.missing_keys();
    if !missing.is_empty() {
        println!(
            "{}",
            format!("Runner will idle until set: {}", missing.join(", ")).yellow()
        );
    }

    Ok(())
}

/// Print the saved settings
pub fn show(config: &Config) -> Result<()> {
    let store = config.store();
    let settings = store.load()?;

    println!("{}", "Settings".bold());
    println!("  File:        {}", store.path().display().to_string().dimmed());
    println!("  Server URL:  {}", display_plain(settings.server_url.as_deref()));
    println!("  API token:   {}", display_secret(settings.api_token.as_deref(), 4));
    println!("  Password:    {}", display_secret(settings.password.as_deref(), 0));
    if let Some(updated_at) = settings.updated_at {
        println!(
            "  Updated:     {}",
            updated_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!();

    let missing = settings.missing_keys();
    if missing.is_empty() {
        println!("{}", "Complete: the runner will poll for requests".green());
    } else {
        println!(
            "{}",
            format!("Incomplete (missing {}): the runner will idle", missing.join(", ")).yellow()
        );
    }

    Ok(())
}

/// Remove the saved settings
pub fn clear(config: &Config) -> Result<()> {
    config.store().clear()?;
    println!("{} Settings cleared", "✓".green());
    Ok(())
}

fn display_plain(value: Option<&str>) -> ColoredString {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => v.normal(),
        None => "(not set)".red(),
    }
}

fn display_secret(value: Option<&str>, visible: usize) -> ColoredString {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => mask_secret(v, visible).normal(),
        None => "(not set)".red(),
    }
}

/// Masks a secret, keeping at most `visible` leading characters
///
/// Short secrets are fully masked so the prefix never reveals most of them.
fn mask_secret(secret: &str, visible: usize) -> String {
    let len = secret.chars().count();
    let shown = if len > visible * 2 { visible } else { 0 };

    let prefix: String = secret.chars().take(shown).collect();
    format!("{}{}", prefix, "*".repeat(8))
}
