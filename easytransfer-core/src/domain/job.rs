//! Job domain types

use serde::{Deserialize, Serialize};

/// Message reported when the host withholds telephony authorization
pub const PERMISSION_DENIED_MESSAGE: &str = "Permission denied";

/// Message reported when the carrier session gave no outcome in time
pub const TIMEOUT_MESSAGE: &str = "timeout";

/// A pending transfer request fetched from the server
///
/// The agent holds at most one of these at a time and consumes it exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub request_id: i64,
    pub amount: f64,
    pub phone_number: String,
}

/// Terminal result of executing a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Carrier accepted the session; carries the network's reply text
    Success(String),
    /// Session failed or was never attempted; carries the reason
    Failure(String),
}

impl JobOutcome {
    /// Outcome for a job that could not run because authorization was withheld
    pub fn permission_denied() -> Self {
        JobOutcome::Failure(PERMISSION_DENIED_MESSAGE.to_string())
    }

    /// Outcome for a session abandoned after the configured timeout
    pub fn timed_out() -> Self {
        JobOutcome::Failure(TIMEOUT_MESSAGE.to_string())
    }

    /// Outcome for a carrier-reported failure code
    pub fn failure_code(code: i32) -> Self {
        JobOutcome::Failure(format!("code={}", code))
    }

    /// Wire status this outcome is reported with
    pub fn report_status(&self) -> ReportStatus {
        match self {
            JobOutcome::Success(_) => ReportStatus::Success,
            JobOutcome::Failure(_) => ReportStatus::Failed,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JobOutcome::Success(message) | JobOutcome::Failure(message) => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }
}

/// Final status accepted by the server's result endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Success,
    Failed,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Success => write!(f, "Success"),
            ReportStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Classified response of a "next job" poll
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// Server has nothing pending; carries its message
    NoJob(String),
    /// A job is ready to execute
    Job(Job),
    /// No response was received (connection, DNS, timeout, body read)
    TransportError(String),
    /// A response arrived but could not be trusted
    ProtocolError(String),
}

impl FetchResult {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            FetchResult::NoJob(_) => "no-job",
            FetchResult::Job(_) => "job",
            FetchResult::TransportError(_) => "transport-error",
            FetchResult::ProtocolError(_) => "protocol-error",
        }
    }
}
