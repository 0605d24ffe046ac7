//! Test doubles shared by the runner's unit tests

use anyhow::Result;
use async_trait::async_trait;
use easytransfer_core::domain::credentials::Credentials;
use easytransfer_core::domain::job::{FetchResult, Job, JobOutcome};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::repository::RequestRepository;
use crate::telephony::{Authorization, SessionCallback, Telephony};

pub fn sample_job() -> Job {
    Job {
        request_id: 7,
        amount: 50.0,
        phone_number: "0912345678".to_string(),
    }
}

pub fn credentials() -> Arc<Credentials> {
    Arc::new(
        Credentials::from_parts(Some("http://server.test"), Some("token"), Some("1234"))
            .unwrap(),
    )
}

/// How the fake backend resolves session requests
#[derive(Debug, Clone)]
pub enum Behavior {
    Respond(String),
    Fail(i32),
    Drop,
    Never,
}

/// Scriptable telephony backend that records every call
pub struct FakeTelephony {
    pub authorized: bool,
    pub sessions_supported: bool,
    pub behavior: Behavior,
    pub dial_fails: bool,
    pub sessions: Mutex<Vec<String>>,
    pub dials: Mutex<Vec<String>>,
    pub pending: Mutex<Vec<SessionCallback>>,
    pub cancels: Mutex<usize>,
}

impl FakeTelephony {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            authorized: true,
            sessions_supported: true,
            behavior,
            dial_fails: false,
            sessions: Mutex::new(Vec::new()),
            dials: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            cancels: Mutex::new(0),
        }
    }

    pub fn denied() -> Self {
        Self {
            authorized: false,
            ..Self::new(Behavior::Respond("unused".to_string()))
        }
    }
}

#[async_trait]
impl Telephony for FakeTelephony {
    fn name(&self) -> &str {
        "fake"
    }

    async fn authorization(&self) -> Authorization {
        if self.authorized {
            Authorization::Granted
        } else {
            Authorization::Denied
        }
    }

    fn supports_session_requests(&self) -> bool {
        self.sessions_supported
    }

    fn send_session_request(&self, code: &str, callback: SessionCallback) {
        self.sessions.lock().unwrap().push(code.to_string());
        match &self.behavior {
            Behavior::Respond(text) => callback.on_response(text.clone()),
            Behavior::Fail(code) => callback.on_failure(*code),
            Behavior::Drop => drop(callback),
            Behavior::Never => self.pending.lock().unwrap().push(callback),
        }
    }

    async fn cancel_session(&self) -> Result<()> {
        *self.cancels.lock().unwrap() += 1;
        self.pending.lock().unwrap().clear();
        Ok(())
    }

    async fn dial(&self, encoded: &str) -> Result<()> {
        self.dials.lock().unwrap().push(encoded.to_string());
        if self.dial_fails {
            anyhow::bail!("no dialer");
        }
        Ok(())
    }
}

/// A report the fake repository received
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub server_url: String,
    pub request_id: i64,
    pub outcome: JobOutcome,
}

/// Scripted server: hands out queued fetch results, then `NoJob` forever
#[derive(Default)]
pub struct FakeRepository {
    pub responses: Mutex<VecDeque<FetchResult>>,
    pub fetches: Mutex<Vec<String>>,
    pub reports: Mutex<Vec<Report>>,
    pub report_fails: bool,
}

impl FakeRepository {
    pub fn with_responses(responses: impl IntoIterator<Item = FetchResult>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestRepository for FakeRepository {
    async fn fetch_next(&self, credentials: &Credentials) -> FetchResult {
        self.fetches
            .lock()
            .unwrap()
            .push(credentials.server_url.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| FetchResult::NoJob("nothing pending".to_string()))
    }

    async fn report_result(
        &self,
        credentials: &Credentials,
        request_id: i64,
        outcome: &JobOutcome,
    ) -> Result<u16> {
        self.reports.lock().unwrap().push(Report {
            server_url: credentials.server_url.clone(),
            request_id,
            outcome: outcome.clone(),
        });
        if self.report_fails {
            anyhow::bail!("server unavailable");
        }
        Ok(200)
    }
}

/// Tracing output captured in memory
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Captures every event logged on this thread until the guard drops
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
