//! Connectivity check DTOs

use serde::{Deserialize, Serialize};

/// Status value the server answers a ping with
pub const STATUS_PONG: &str = "pong";

/// Body of `GET /ping-auth`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub authenticated: Option<bool>,
}

impl PingResponse {
    /// True when the server answered with a pong (case-insensitive)
    pub fn is_pong(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(STATUS_PONG))
    }
}
