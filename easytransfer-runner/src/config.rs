//! Runner configuration
//!
//! Process-level settings for the agent: where the credential settings live,
//! loop timing, and the telephony backend. Server credentials themselves are
//! not configured here; they are re-read from the settings store every cycle.

use easytransfer_core::settings::{SETTINGS_PATH_ENV, default_settings_path};
use std::path::PathBuf;
use std::time::Duration;

use crate::scheduler::machine::COOLDOWN;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings file holding server_url, api_token and password
    pub settings_path: PathBuf,

    /// Delay between poll cycles and between idle re-checks
    pub poll_interval: Duration,

    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,

    /// How long to wait for a carrier session outcome; `None` waits forever
    pub session_timeout: Option<Duration>,

    /// ModemManager binary
    pub mmcli_path: String,

    /// Modem selector passed to mmcli
    pub modem_id: String,

    /// Whether the redundant dial fires alongside every session request
    pub dial_fallback: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(settings_path: PathBuf) -> Self {
        Self {
            settings_path,
            poll_interval: COOLDOWN,
            http_timeout: Duration::from_secs(15),
            session_timeout: None,
            mmcli_path: "mmcli".to_string(),
            modem_id: "any".to_string(),
            dial_fallback: true,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - EASYTRANSFER_SETTINGS (default: ~/.config/easytransfer/settings.json)
    /// - POLL_INTERVAL (seconds, default: 30)
    /// - HTTP_TIMEOUT (seconds, default: 15)
    /// - SESSION_TIMEOUT (seconds, 0 = wait forever, default: 0)
    /// - MMCLI_PATH (default: mmcli)
    /// - MODEM_ID (default: any)
    /// - DIAL_FALLBACK (true/false, default: true)
    pub fn from_env() -> Self {
        let settings_path = std::env::var_os(SETTINGS_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_settings_path);

        let defaults = Self::new(settings_path);

        let poll_interval = env_seconds("POLL_INTERVAL").unwrap_or(defaults.poll_interval);

        let http_timeout = env_seconds("HTTP_TIMEOUT").unwrap_or(defaults.http_timeout);

        let session_timeout = match env_seconds("SESSION_TIMEOUT") {
            Some(timeout) if timeout.is_zero() => None,
            Some(timeout) => Some(timeout),
            None => defaults.session_timeout,
        };

        let mmcli_path = std::env::var("MMCLI_PATH").unwrap_or(defaults.mmcli_path);

        let modem_id = std::env::var("MODEM_ID").unwrap_or(defaults.modem_id);

        let dial_fallback = std::env::var("DIAL_FALLBACK")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.dial_fallback);

        Self {
            settings_path: defaults.settings_path,
            poll_interval,
            http_timeout,
            session_timeout,
            mmcli_path,
            modem_id,
            dial_fallback,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.settings_path.as_os_str().is_empty() {
            anyhow::bail!("settings_path cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.http_timeout.is_zero() {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        if self.mmcli_path.is_empty() {
            anyhow::bail!("mmcli_path cannot be empty");
        }

        if self.modem_id.is_empty() {
            anyhow::bail!("modem_id cannot be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_settings_path())
    }
}

fn env_seconds(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert_eq!(config.session_timeout, None);
        assert!(config.dial_fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::new(PathBuf::from("/tmp/settings.json"));

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Zero interval should fail
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        config.poll_interval = Duration::from_secs(30);

        // Empty modem selector should fail
        config.modem_id = String::new();
        assert!(config.validate().is_err());

        config.modem_id = "0".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
