//! Requests repository
//!
//! Handles communication with the server for transfer requests:
//! - Fetching the next pending request
//! - Reporting the outcome of an executed request

use anyhow::{Context, Result};
use async_trait::async_trait;
use easytransfer_client::TransferClient;
use easytransfer_core::domain::credentials::Credentials;
use easytransfer_core::domain::job::{FetchResult, JobOutcome};
use reqwest::Client;
use tracing::debug;

/// Repository trait for transfer request operations with the server
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Fetches the next pending request
    ///
    /// Never fails; transport and protocol problems are folded into the result.
    async fn fetch_next(&self, credentials: &Credentials) -> FetchResult;

    /// Reports the outcome of an executed request
    ///
    /// # Arguments
    /// * `request_id` - The server's id for the request
    /// * `outcome` - The job outcome
    async fn report_result(
        &self,
        credentials: &Credentials,
        request_id: i64,
        outcome: &JobOutcome,
    ) -> Result<u16>;
}

/// HTTP implementation of RequestRepository
///
/// One `reqwest::Client` (and its connection pool) is shared by every cycle.
pub struct HttpRequestRepository {
    client: Client,
}

impl HttpRequestRepository {
    /// Creates a new HTTP request repository
    ///
    /// # Arguments
    /// * `client` - Configured HTTP client (timeouts etc.)
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn server(&self, credentials: &Credentials) -> TransferClient {
        TransferClient::with_client(
            credentials.server_url.as_str(),
            credentials.token(),
            self.client.clone(),
        )
    }
}

#[async_trait]
impl RequestRepository for HttpRequestRepository {
    async fn fetch_next(&self, credentials: &Credentials) -> FetchResult {
        let result = self.server(credentials).fetch_next_request().await;
        debug!("Fetch from {} returned {}", credentials.server_url, result.kind());
        result
    }

    async fn report_result(
        &self,
        credentials: &Credentials,
        request_id: i64,
        outcome: &JobOutcome,
    ) -> Result<u16> {
        self.server(credentials)
            .report_result(request_id, outcome)
            .await
            .with_context(|| format!("Failed to report result for request {}", request_id))
    }
}
