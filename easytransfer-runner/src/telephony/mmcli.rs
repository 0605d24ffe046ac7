//! ModemManager telephony backend
//!
//! Drives a cellular modem through the `mmcli` command line tool:
//! - Authorization: the configured modem answers `mmcli -m <modem>`
//! - Carrier session: `--3gpp-ussd-initiate`, reply text parsed from stdout
//! - Cancel: kills a running initiate, then `--3gpp-ussd-cancel`
//! - Dial: `--voice-create-call` with the decoded code

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Output;
use std::sync::Mutex;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Authorization, SessionCallback, Telephony, decode_dial_string};
use crate::config::Config;

/// Failure code used when the session command could not run or was killed
const NO_EXIT_CODE: i32 = -1;

/// Stands in for the session code in logged mmcli output
const CODE_PLACEHOLDER: &str = "[SESSION CODE]";

/// Telephony backed by ModemManager
#[derive(Debug)]
pub struct ModemManagerTelephony {
    mmcli_path: String,
    modem: String,
    dial_enabled: bool,
    /// Task running the last `--3gpp-ussd-initiate`
    session: Mutex<Option<JoinHandle<()>>>,
}

impl ModemManagerTelephony {
    /// Creates a new ModemManager backend
    ///
    /// # Arguments
    /// * `mmcli_path` - Path or name of the `mmcli` binary
    /// * `modem` - Modem selector passed to `-m` (index, path or "any")
    /// * `dial_enabled` - Whether `dial` places a voice call; when off it fails without dialing
    pub fn new(mmcli_path: impl Into<String>, modem: impl Into<String>, dial_enabled: bool) -> Self {
        Self {
            mmcli_path: mmcli_path.into(),
            modem: modem.into(),
            dial_enabled,
            session: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.mmcli_path.clone(),
            config.modem_id.clone(),
            config.dial_fallback,
        )
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.mmcli_path);
        command.arg("-m").arg(&self.modem).kill_on_drop(true);
        command
    }

    fn take_session(&self) -> Option<JoinHandle<()>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

#[async_trait]
impl Telephony for ModemManagerTelephony {
    fn name(&self) -> &str {
        "mmcli"
    }

    async fn authorization(&self) -> Authorization {
        match self.command().output().await {
            Ok(output) if output.status.success() => Authorization::Granted,
            Ok(output) => {
                debug!(
                    "Modem {} not available: {}",
                    self.modem,
                    stderr_of(&output)
                );
                Authorization::Denied
            }
            Err(e) => {
                debug!("Failed to execute {}: {}", self.mmcli_path, e);
                Authorization::Denied
            }
        }
    }

    fn supports_session_requests(&self) -> bool {
        true
    }

    fn send_session_request(&self, code: &str, callback: SessionCallback) {
        let mut initiate = self.command();
        initiate.arg(format!("--3gpp-ussd-initiate={}", code));

        let mut cancel = self.command();
        cancel.arg("--3gpp-ussd-cancel");

        let code = code.to_string();
        let task = tokio::spawn(async move {
            match initiate.output().await {
                Ok(output) if output.status.success() => {
                    let reply = parse_ussd_reply(&String::from_utf8_lossy(&output.stdout));
                    callback.on_response(reply);

                    // Close any menu the network left open so the next session can start
                    if let Err(e) = cancel.output().await {
                        debug!("Failed to cancel USSD session: {}", e);
                    }
                }
                Ok(output) => {
                    let exit = output.status.code().unwrap_or(NO_EXIT_CODE);
                    warn!(
                        "USSD session failed (exit {}): {}",
                        exit,
                        redact(&stderr_of(&output), &code)
                    );
                    callback.on_failure(exit);
                }
                Err(e) => {
                    warn!("Failed to start USSD session: {}", e);
                    callback.on_failure(NO_EXIT_CODE);
                }
            }
        });

        let previous = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(task);
        if let Some(previous) = previous.filter(|t| !t.is_finished()) {
            warn!("Starting a USSD session while another is still running");
            previous.abort();
        }
    }

    async fn cancel_session(&self) -> Result<()> {
        if let Some(task) = self.take_session() {
            task.abort();
            // Dropping the task kills the mmcli child
            let _ = task.await;
        }

        let output = self
            .command()
            .arg("--3gpp-ussd-cancel")
            .output()
            .await
            .context("Failed to execute mmcli --3gpp-ussd-cancel")?;

        if !output.status.success() {
            anyhow::bail!("mmcli --3gpp-ussd-cancel failed: {}", stderr_of(&output));
        }

        info!("USSD session cancelled on modem {}", self.modem);
        Ok(())
    }

    async fn dial(&self, encoded: &str) -> Result<()> {
        if !self.dial_enabled {
            anyhow::bail!("dialing disabled for modem {}", self.modem);
        }

        let number = decode_dial_string(encoded).context("Invalid dial string")?;
        info!("Dialing session code on modem {}", self.modem);

        let output = self
            .command()
            .arg(format!("--voice-create-call=number={}", number))
            .output()
            .await
            .context("Failed to execute mmcli --voice-create-call")?;

        if !output.status.success() {
            anyhow::bail!(
                "mmcli --voice-create-call failed: {}",
                redact(&stderr_of(&output), &number)
            );
        }

        Ok(())
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// mmcli echoes the code back in some errors; it embeds the password
fn redact(text: &str, code: &str) -> String {
    text.replace(code, CODE_PLACEHOLDER)
}

/// Extracts the network reply from `mmcli --3gpp-ussd-initiate` output
///
/// mmcli prints `... new reply from network: '<text>'`; anything else is
/// returned trimmed as-is.
fn parse_ussd_reply(stdout: &str) -> String {
    const MARKER: &str = "reply from network:";

    let Some(start) = stdout.find(MARKER) else {
        return stdout.trim().to_string();
    };

    let reply = stdout[start + MARKER.len()..].trim();
    reply
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .unwrap_or(reply)
        .to_string()
}
