//! Job poller
//!
//! Drives the poll state machine. Every action the machine asks for runs in
//! its own task, and that task's completion is posted back over a channel as
//! the next event. Since the machine only ever has one action outstanding,
//! cycles never overlap.

use anyhow::Result;
use easytransfer_core::domain::credentials::Credentials;
use easytransfer_core::settings::SettingsStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Instrument, Span, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::repository::RequestRepository;
use crate::scheduler::machine::{Action, Event, PollMachine};
use crate::service::SessionExecutor;

/// Job poller that continuously polls for and executes transfer requests
pub struct JobPoller {
    poll_interval: Duration,
    settings: Arc<dyn SettingsStore>,
    repository: Arc<dyn RequestRepository>,
    executor: Arc<SessionExecutor>,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(
        config: &Config,
        settings: Arc<dyn SettingsStore>,
        repository: Arc<dyn RequestRepository>,
        executor: Arc<SessionExecutor>,
    ) -> Self {
        Self {
            poll_interval: config.poll_interval,
            settings,
            repository,
            executor,
        }
    }

    /// Runs the polling loop
    ///
    /// Only returns if the event channel breaks; every job-level failure is
    /// handled inside the loop.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting job poller (interval: {:?})",
            self.poll_interval
        );

        let (tx, mut rx) = mpsc::channel(1);
        let mut cycle = Span::none();

        let credentials = load_credentials(self.settings.as_ref());
        let (mut machine, action) = PollMachine::new(credentials, self.poll_interval);
        self.dispatch(action, &tx, &mut cycle);

        while let Some(event) = rx.recv().await {
            if let Some(action) = machine.handle(event) {
                debug!("Poll state: {:?}", machine.phase());
                self.dispatch(action, &tx, &mut cycle);
            }
        }

        anyhow::bail!("poller event channel closed")
    }

    /// Starts the task performing `action`
    fn dispatch(&self, action: Action, tx: &mpsc::Sender<Event>, cycle: &mut Span) {
        match action {
            Action::LoadCredentials => {
                let settings = Arc::clone(&self.settings);
                spawn_step(tx, Span::none(), async move {
                    Event::CredentialsLoaded(load_credentials(settings.as_ref()))
                });
            }
            Action::Fetch(credentials) => {
                *cycle = info_span!("cycle", id = %Uuid::new_v4());
                debug!(parent: &*cycle, "Polling {}", credentials.server_url);

                let repository = Arc::clone(&self.repository);
                spawn_step(tx, cycle.clone(), async move {
                    Event::FetchCompleted(repository.fetch_next(&credentials).await)
                });
            }
            Action::ExecuteSession { credentials, job } => {
                let executor = Arc::clone(&self.executor);
                spawn_step(tx, cycle.clone(), async move {
                    Event::SessionResolved(executor.execute(&job, credentials.password()).await)
                });
            }
            Action::Report {
                credentials,
                request_id,
                outcome,
            } => {
                let repository = Arc::clone(&self.repository);
                spawn_step(tx, cycle.clone(), async move {
                    let result = repository
                        .report_result(&credentials, request_id, &outcome)
                        .await
                        .map_err(|e| format!("{:#}", e));
                    Event::ReportCompleted(result)
                });
            }
            Action::Sleep(delay) => {
                debug!("Next poll in {:?}", delay);
                spawn_step(tx, Span::none(), async move {
                    tokio::time::sleep(delay).await;
                    Event::DelayElapsed
                });
            }
        }
    }
}

/// Runs `step` in its own task and posts the resulting event back to the loop
fn spawn_step<F>(tx: &mpsc::Sender<Event>, span: Span, step: F)
where
    F: Future<Output = Event> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(
        async move {
            let event = step.await;
            if tx.send(event).await.is_err() {
                debug!("Poller stopped, dropping event");
            }
        }
        .instrument(span),
    );
}

/// Reads the settings store; unreadable settings count as incomplete
fn load_credentials(settings: &dyn SettingsStore) -> Option<Arc<Credentials>> {
    match settings.load() {
        Ok(settings) => settings.credentials().map(Arc::new),
        Err(e) => {
            warn!("Failed to read settings: {:#}", e);
            None
        }
    }
}
