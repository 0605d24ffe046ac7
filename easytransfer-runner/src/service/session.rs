//! Session execution service
//!
//! Builds the carrier session code for a job, dispatches it through the
//! telephony backend and waits for the authoritative outcome.
//!
//! Both the session request and a raw dial of the encoded code are fired.
//! Only the session callback decides what gets reported.

use easytransfer_core::domain::job::{Job, JobOutcome};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::telephony::{Authorization, SessionCallback, SessionResponse, Telephony, encode_dial_string};

/// Placeholder the password is replaced with in logged session codes
const PASSWORD_PLACEHOLDER: &str = "[PASSWORD]";

/// Reported when a backend can only dial and never sees the carrier's answer
pub const DISPATCH_ONLY_MESSAGE: &str = "USSD code sent (no response available on this device)";

/// Ways a session can end without a trustworthy outcome
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Backend gave up on the callback without resolving it
    #[error("telephony backend dropped the session callback")]
    CallbackDropped,
}

/// Builds the carrier session code for a job
///
/// Template: `*150*1*<password>*1*<phone>*<phone>*<amount>#`
pub fn session_code(job: &Job, password: &str) -> String {
    render(job, password)
}

/// Session code with the password masked, safe to log
pub fn masked_session_code(job: &Job) -> String {
    render(job, PASSWORD_PLACEHOLDER)
}

fn render(job: &Job, password: &str) -> String {
    format!(
        "*150*1*{}*1*{}*{}*{}#",
        password,
        job.phone_number,
        job.phone_number,
        format_amount(job.amount)
    )
}

/// Whole amounts keep one decimal place (`50.0`), others print as-is
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.1}", amount)
    } else {
        amount.to_string()
    }
}

/// Executes jobs as carrier sessions
pub struct SessionExecutor {
    telephony: Arc<dyn Telephony>,
    timeout: Option<Duration>,
}

impl SessionExecutor {
    /// Creates a new session executor
    ///
    /// # Arguments
    /// * `telephony` - Host telephony backend
    /// * `timeout` - How long to wait for the session callback; `None` waits forever
    pub fn new(telephony: Arc<dyn Telephony>, timeout: Option<Duration>) -> Self {
        Self { telephony, timeout }
    }

    /// Executes a job and waits for its outcome
    ///
    /// Withheld authorization short-circuits to a `Permission denied` failure
    /// without touching the backend. A session still running when the timeout
    /// expires is cancelled and ends as a `timeout` failure. An `Err` means no
    /// outcome can be trusted and the job must not be reported.
    pub async fn execute(&self, job: &Job, password: &str) -> Result<JobOutcome, SessionError> {
        info!(
            "Executing request {} via {}: {}",
            job.request_id,
            self.telephony.name(),
            masked_session_code(job)
        );

        if self.telephony.authorization().await == Authorization::Denied {
            warn!(
                "Telephony authorization withheld, skipping request {}",
                job.request_id
            );
            return Ok(JobOutcome::permission_denied());
        }

        let code = session_code(job, password);
        let encoded = encode_dial_string(&code);

        if !self.telephony.supports_session_requests() {
            return Ok(match self.telephony.dial(&encoded).await {
                Ok(()) => JobOutcome::Success(DISPATCH_ONLY_MESSAGE.to_string()),
                Err(e) => {
                    warn!("Dial failed for request {}: {:#}", job.request_id, e);
                    JobOutcome::failure_code(-1)
                }
            });
        }

        let (callback, response) = SessionCallback::channel();
        self.telephony.send_session_request(&code, callback);

        if let Err(e) = self.telephony.dial(&encoded).await {
            warn!(
                "Fallback dial failed for request {}: {:#}",
                job.request_id, e
            );
        }

        let response = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, response).await {
                Ok(response) => response,
                Err(_) => {
                    warn!(
                        "No outcome for request {} after {:?}, cancelling session",
                        job.request_id, limit
                    );
                    if let Err(e) = self.telephony.cancel_session().await {
                        warn!("Failed to cancel session: {:#}", e);
                    }
                    return Ok(JobOutcome::timed_out());
                }
            },
            None => response.await,
        };

        match response {
            Ok(SessionResponse::Received(text)) => Ok(JobOutcome::Success(text)),
            Ok(SessionResponse::Failed(code)) => Ok(JobOutcome::failure_code(code)),
            Err(_) => Err(SessionError::CallbackDropped),
        }
    }
}
