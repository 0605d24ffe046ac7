//! Poll loop state machine
//!
//! Pure transition logic for the polling loop. The machine never performs I/O:
//! each event it handles yields the single action the driver must perform
//! next, and the completion of that action comes back as the next event.
//! This keeps one fetch/execute/report cycle in flight at most.
//!
//! ```text
//!  Idle ──delay──> load ──incomplete──> Idle
//!                    └──complete──> Fetching ──job──> AwaitingSessionOutcome ──> Reporting
//!                                      └──no job / error──> Cooldown <──────────────┘
//!  Cooldown ──delay──> load ...
//! ```

use easytransfer_core::domain::credentials::Credentials;
use easytransfer_core::domain::job::{FetchResult, Job, JobOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::service::SessionError;

/// Delay applied after every cycle outcome and while credentials are missing
pub const COOLDOWN: Duration = Duration::from_secs(30);

/// Where the loop currently is
///
/// The credentials snapshot read at the start of a cycle travels with the
/// active states, so one cycle always uses one set of credentials.
#[derive(Debug)]
pub enum PollState {
    /// Credentials incomplete; waiting to re-check
    Idle,
    /// Waiting for the next-job response
    Fetching { credentials: Arc<Credentials> },
    /// Waiting for the carrier session callback
    AwaitingSessionOutcome {
        credentials: Arc<Credentials>,
        request_id: i64,
    },
    /// Waiting for the result report to finish
    Reporting { request_id: i64 },
    /// Waiting out the fixed delay before the next poll
    Cooldown,
}

/// Discriminant of `PollState`, for assertions and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    AwaitingSessionOutcome,
    Reporting,
    Cooldown,
}

impl PollState {
    pub fn phase(&self) -> Phase {
        match self {
            PollState::Idle => Phase::Idle,
            PollState::Fetching { .. } => Phase::Fetching,
            PollState::AwaitingSessionOutcome { .. } => Phase::AwaitingSessionOutcome,
            PollState::Reporting { .. } => Phase::Reporting,
            PollState::Cooldown => Phase::Cooldown,
        }
    }
}

/// Completion of the previously requested action
#[derive(Debug)]
pub enum Event {
    /// Settings were re-read; `None` when incomplete or unreadable
    CredentialsLoaded(Option<Arc<Credentials>>),
    FetchCompleted(FetchResult),
    SessionResolved(Result<JobOutcome, SessionError>),
    /// Result report finished; the error is only logged
    ReportCompleted(Result<u16, String>),
    DelayElapsed,
}

/// Work the driver must perform next
#[derive(Debug)]
pub enum Action {
    LoadCredentials,
    Fetch(Arc<Credentials>),
    ExecuteSession {
        credentials: Arc<Credentials>,
        job: Job,
    },
    Report {
        credentials: Arc<Credentials>,
        request_id: i64,
        outcome: JobOutcome,
    },
    Sleep(Duration),
}

/// The poll loop state machine
#[derive(Debug)]
pub struct PollMachine {
    state: PollState,
    cooldown: Duration,
}

impl PollMachine {
    /// Creates the machine from the first credentials read
    ///
    /// Starts in `Fetching` when credentials are complete, `Idle` otherwise,
    /// and returns the first action to perform.
    pub fn new(credentials: Option<Arc<Credentials>>, cooldown: Duration) -> (Self, Action) {
        let mut machine = Self {
            state: PollState::Idle,
            cooldown,
        };
        let action = machine.begin_cycle(credentials);
        (machine, action)
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Applies an event and returns the next action
    ///
    /// Returns `None` when the event does not belong to the current state;
    /// the event is dropped and the machine keeps waiting for the in-flight action.
    pub fn handle(&mut self, event: Event) -> Option<Action> {
        let state = std::mem::replace(&mut self.state, PollState::Cooldown);

        match (state, event) {
            (state @ (PollState::Idle | PollState::Cooldown), Event::DelayElapsed) => {
                self.state = state;
                Some(Action::LoadCredentials)
            }
            (PollState::Idle | PollState::Cooldown, Event::CredentialsLoaded(credentials)) => {
                Some(self.begin_cycle(credentials))
            }
            (PollState::Fetching { credentials }, Event::FetchCompleted(result)) => {
                Some(self.on_fetch(credentials, result))
            }
            (
                PollState::AwaitingSessionOutcome {
                    credentials,
                    request_id,
                },
                Event::SessionResolved(resolved),
            ) => Some(self.on_session(credentials, request_id, resolved)),
            (PollState::Reporting { request_id }, Event::ReportCompleted(result)) => {
                match result {
                    Ok(code) => info!("Reported request {} (HTTP {})", request_id, code),
                    Err(e) => warn!("Failed to report request {}: {}", request_id, e),
                }
                Some(self.cool_down())
            }
            (state, event) => {
                warn!("Ignoring {:?} while in {:?}", event, state.phase());
                self.state = state;
                None
            }
        }
    }

    fn begin_cycle(&mut self, credentials: Option<Arc<Credentials>>) -> Action {
        match credentials {
            Some(credentials) => {
                self.state = PollState::Fetching {
                    credentials: Arc::clone(&credentials),
                };
                Action::Fetch(credentials)
            }
            None => {
                info!("Server URL, API token or transfer password missing; idling");
                self.state = PollState::Idle;
                Action::Sleep(self.cooldown)
            }
        }
    }

    fn on_fetch(&mut self, credentials: Arc<Credentials>, result: FetchResult) -> Action {
        match result {
            FetchResult::NoJob(message) => {
                info!("No pending request: {}", message);
                self.cool_down()
            }
            FetchResult::TransportError(cause) => {
                warn!("Fetch failed: {}", cause);
                self.cool_down()
            }
            FetchResult::ProtocolError(detail) => {
                error!("Unusable fetch response: {}", detail);
                self.cool_down()
            }
            FetchResult::Job(job) => {
                info!(
                    "Received request {} ({} to {})",
                    job.request_id, job.amount, job.phone_number
                );
                self.state = PollState::AwaitingSessionOutcome {
                    credentials: Arc::clone(&credentials),
                    request_id: job.request_id,
                };
                Action::ExecuteSession { credentials, job }
            }
        }
    }

    fn on_session(
        &mut self,
        credentials: Arc<Credentials>,
        request_id: i64,
        resolved: Result<JobOutcome, SessionError>,
    ) -> Action {
        match resolved {
            Ok(outcome) => {
                if outcome.is_success() {
                    info!("Request {} succeeded: {}", request_id, outcome.message());
                } else {
                    warn!("Request {} failed: {}", request_id, outcome.message());
                }
                self.state = PollState::Reporting { request_id };
                Action::Report {
                    credentials,
                    request_id,
                    outcome,
                }
            }
            Err(e) => {
                // Nothing trustworthy to report; the server keeps the request in Processing
                error!("Request {} left unreported: {}", request_id, e);
                self.cool_down()
            }
        }
    }

    fn cool_down(&mut self) -> Action {
        self.state = PollState::Cooldown;
        Action::Sleep(self.cooldown)
    }
}
