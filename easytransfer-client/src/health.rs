//! Connectivity check endpoint

use crate::TransferClient;
use crate::error::Result;
use easytransfer_core::dto::health::PingResponse;

impl TransferClient {
    /// Check that the server is reachable and accepts the token
    ///
    /// # Returns
    /// `true` if the server answered `{"status": "pong"}`
    pub async fn ping_auth(&self) -> Result<bool> {
        let response = self.get("/ping-auth").send().await?;
        let ping: PingResponse = self.handle_response(response).await?;

        Ok(ping.is_pong())
    }
}
