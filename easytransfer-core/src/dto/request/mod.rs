//! Transfer request DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{FetchResult, Job, JobOutcome, ReportStatus};

/// Status value of a `/requests/next` body that carries a job
pub const STATUS_OK: &str = "ok";
/// Status value of a `/requests/next` body with nothing pending
pub const STATUS_EMPTY: &str = "empty";

/// Body of `GET /requests/next`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextRequestResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<i64>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl NextRequestResponse {
    /// Parses a raw body, mapping anything that is not a JSON object to a protocol error
    pub fn parse(body: &str) -> FetchResult {
        match serde_json::from_str::<NextRequestResponse>(body) {
            Ok(response) => response.classify(),
            Err(e) => FetchResult::ProtocolError(format!("malformed response body: {}", e)),
        }
    }

    /// Classifies the body into a fetch result
    ///
    /// The status comparison is case-insensitive. A job is only produced when
    /// the status is `ok` and every job field is present.
    pub fn classify(self) -> FetchResult {
        let status = self.status.unwrap_or_default();

        match status.trim().to_lowercase().as_str() {
            STATUS_EMPTY => FetchResult::NoJob(self.message.unwrap_or_default()),
            STATUS_OK => {
                let Some(request_id) = self.request_id else {
                    return FetchResult::ProtocolError("job is missing request_id".to_string());
                };
                let Some(amount) = self.amount.filter(|a| a.is_finite()) else {
                    return FetchResult::ProtocolError(format!(
                        "job {} is missing a valid amount",
                        request_id
                    ));
                };
                let Some(phone_number) = self.phone_number.filter(|p| !p.trim().is_empty())
                else {
                    return FetchResult::ProtocolError(format!(
                        "job {} is missing phone_number",
                        request_id
                    ));
                };

                FetchResult::Job(Job {
                    request_id,
                    amount,
                    phone_number: phone_number.trim().to_string(),
                })
            }
            _ => FetchResult::ProtocolError(format!("unexpected status: {:?}", status)),
        }
    }
}

/// Body of `POST /requests/{id}/result`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReport {
    pub status: ReportStatus,
    pub message: String,
}

impl From<&JobOutcome> for ResultReport {
    fn from(outcome: &JobOutcome) -> Self {
        Self {
            status: outcome.report_status(),
            message: outcome.message().to_string(),
        }
    }
}

/// Body of `GET /requests/status/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStatus {
    pub request_id: i64,
    pub phone_number: String,
    pub amount: f64,
    pub status: String,
}
