//! EasyTransfer HTTP Client
//!
//! A small, typed HTTP client for the transfer server API.
//!
//! Both the background agent and the settings CLI use it, so the server
//! contract (paths, bearer auth, bodies) lives in one place.
//!
//! # Example
//!
//! ```no_run
//! use easytransfer_client::TransferClient;
//! use easytransfer_core::domain::job::FetchResult;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = TransferClient::new("http://localhost:5000", "my-token");
//!
//!     match client.fetch_next_request().await {
//!         FetchResult::Job(job) => println!("job {}", job.request_id),
//!         other => println!("nothing to do: {}", other.kind()),
//!     }
//! }
//! ```

pub mod error;
mod health;
mod requests;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

/// HTTP client for the transfer server API
///
/// Every request is authenticated with `Authorization: Bearer <token>`.
/// Endpoints are grouped by concern:
/// - Transfer requests (fetch next, report result, query status)
/// - Connectivity check
#[derive(Debug)]
pub struct TransferClient {
    /// Base URL of the server (e.g., "http://localhost:5000")
    base_url: String,
    /// API token sent as a bearer credential
    api_token: SecretString,
    /// HTTP client instance
    client: Client,
}

impl TransferClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:5000")
    /// * `api_token` - The account's API token
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self::with_client(base_url, api_token, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows configuring timeouts, proxies, TLS settings, etc., and
    /// sharing one connection pool between short-lived clients.
    ///
    /// # Example
    /// ```
    /// use easytransfer_client::TransferClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(15))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = TransferClient::with_client("http://localhost:5000", "token", http_client);
    /// ```
    pub fn with_client(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: SecretString::from(api_token.into()),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_token.expose_secret())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_token.expose_secret())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let body = self.handle_text_response(response).await?;

        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response and return the raw body
    ///
    /// Non-success status codes become `ApiError`; a body that cannot be read
    /// stays a transport failure.
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<u16> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(status.as_u16())
    }
}
