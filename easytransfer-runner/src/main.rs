//! EasyTransfer Runner
//!
//! A background agent that turns pending transfer requests into carrier
//! (USSD) sessions.
//!
//! Architecture:
//! - Configuration: process settings from environment or defaults
//! - Settings store: server URL, API token and transfer password, re-read every cycle
//! - Repositories: HTTP communication with the transfer server
//! - Services: session execution through the telephony backend
//! - Scheduler: the poll state machine and the task driving it
//!
//! The runner polls the server for the next request, executes it, reports the
//! outcome, then waits a fixed interval before polling again. No failure is
//! fatal to the loop; it runs until the process is stopped.

mod config;
mod repository;
mod scheduler;
mod service;
mod telephony;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use easytransfer_core::settings::{FileSettingsStore, SettingsStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{HttpRequestRepository, RequestRepository};
use crate::scheduler::JobPoller;
use crate::service::SessionExecutor;
use crate::telephony::{ModemManagerTelephony, Telephony};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "easytransfer_runner=info,easytransfer_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EasyTransfer Runner");

    // Load configuration
    let config = Config::from_env();
    config.validate()?;
    let store = FileSettingsStore::new(config.settings_path.clone());
    info!(
        "Loaded configuration: settings={}, modem={}, dial fallback={}",
        store.path().display(),
        config.modem_id,
        config.dial_fallback
    );

    let settings: Arc<dyn SettingsStore> = Arc::new(store);

    match settings.load() {
        Ok(current) => {
            let missing = current.missing_keys();
            if !missing.is_empty() {
                warn!(
                    "Settings incomplete (missing {}); runner will idle until configured",
                    missing.join(", ")
                );
            }
        }
        Err(e) => warn!("Failed to read settings: {:#}", e),
    }

    // Initialize HTTP client
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let repository: Arc<dyn RequestRepository> = Arc::new(HttpRequestRepository::new(http_client));

    // Initialize telephony and services
    let telephony: Arc<dyn Telephony> = Arc::new(ModemManagerTelephony::from_config(&config));
    let executor = Arc::new(SessionExecutor::new(telephony, config.session_timeout));

    info!("Services initialized");
    info!(
        "Poll interval: {:?}, HTTP timeout: {:?}, session timeout: {:?}",
        config.poll_interval, config.http_timeout, config.session_timeout
    );

    // Create job poller
    let poller = JobPoller::new(&config, settings, repository, executor);

    tokio::select! {
        result = poller.run() => {
            if let Err(e) = &result {
                error!("Poller error: {:#}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
