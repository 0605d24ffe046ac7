//! Server credentials

use secrecy::{ExposeSecret, SecretString};

/// Everything the agent needs to talk to the server and authorize transfers.
///
/// Only constructed when all three parts are present, so holding a
/// `Credentials` value means a poll cycle is allowed to run.
#[derive(Debug)]
pub struct Credentials {
    /// Server base URL (e.g., "https://transfer.example.com")
    pub server_url: String,
    /// Bearer token sent with every request
    pub api_token: SecretString,
    /// Carrier transfer password embedded in the session code
    pub transfer_password: SecretString,
}

impl Credentials {
    /// Builds credentials from optional parts
    ///
    /// Returns `None` if any part is missing or blank.
    pub fn from_parts(
        server_url: Option<&str>,
        api_token: Option<&str>,
        transfer_password: Option<&str>,
    ) -> Option<Self> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.trim().is_empty())
        }

        let server_url = present(server_url)?;
        let api_token = present(api_token)?;
        let transfer_password = present(transfer_password)?;

        Some(Self {
            server_url: server_url.trim().to_string(),
            api_token: SecretString::from(api_token.to_string()),
            transfer_password: SecretString::from(transfer_password.to_string()),
        })
    }

    /// Returns the bearer token
    pub fn token(&self) -> &str {
        self.api_token.expose_secret()
    }

    /// Returns the transfer password
    pub fn password(&self) -> &str {
        self.transfer_password.expose_secret()
    }
}
