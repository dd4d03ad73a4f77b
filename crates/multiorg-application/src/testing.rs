//! Scripted fakes of the org capability traits, plus a log capture.

use async_trait::async_trait;
use multiorg_core::bulk::{BulkJobHandle, FailedRecord, IngestRequest, JobStatusSnapshot};
use multiorg_core::org::{
    ConnectionName, OrgAuthorizer, OrgIdentity, OrgSession, QueryResponse, Record,
};
use multiorg_core::{MultiorgError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Formatted log output collected for the current thread.
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Routes every event on this thread into the capture until the guard drops.
    pub(crate) fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn count(&self, needle: &str) -> usize {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub(crate) fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

pub(crate) fn query_response(records: Vec<Record>) -> QueryResponse {
    QueryResponse {
        total_size: records.len() as u64,
        done: true,
        records,
        next_records_url: None,
    }
}

pub(crate) struct FakeSession {
    identity: OrgIdentity,
    query_delay: Duration,
    query_result: Result<QueryResponse>,
    submit_result: Result<Vec<BulkJobHandle>>,
    statuses: Mutex<VecDeque<Result<JobStatusSnapshot>>>,
    failed_result: Result<Vec<FailedRecord>>,
    pub submitted: Mutex<Vec<IngestRequest>>,
    pub queries: Mutex<Vec<String>>,
    pub status_calls: AtomicUsize,
    pub failed_calls: AtomicUsize,
}

impl FakeSession {
    pub fn new(id: &str) -> Self {
        Self {
            identity: OrgIdentity {
                id: id.to_string(),
                username: format!("admin@{id}.example.com"),
            },
            query_delay: Duration::ZERO,
            query_result: Ok(query_response(Vec::new())),
            submit_result: Ok(vec![BulkJobHandle {
                id: format!("750{id}"),
                object: "Account".to_string(),
            }]),
            statuses: Mutex::new(VecDeque::new()),
            failed_result: Ok(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            failed_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_query(mut self, result: Result<QueryResponse>) -> Self {
        self.query_result = result;
        self
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    pub fn with_submit(mut self, result: Result<Vec<BulkJobHandle>>) -> Self {
        self.submit_result = result;
        self
    }

    pub fn with_statuses(self, statuses: Vec<Result<JobStatusSnapshot>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_failed_records(mut self, result: Result<Vec<FailedRecord>>) -> Self {
        self.failed_result = result;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn failed_calls(&self) -> usize {
        self.failed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrgSession for FakeSession {
    fn identity(&self) -> &OrgIdentity {
        &self.identity
    }

    async fn query(&self, soql: &str) -> Result<QueryResponse> {
        self.queries.lock().unwrap().push(soql.to_string());
        if !self.query_delay.is_zero() {
            tokio::time::sleep(self.query_delay).await;
        }
        self.query_result.clone()
    }

    async fn submit_ingest(&self, request: &IngestRequest) -> Result<Vec<BulkJobHandle>> {
        self.submitted.lock().unwrap().push(request.clone());
        self.submit_result.clone()
    }

    async fn job_status(&self, _job: &BulkJobHandle) -> Result<JobStatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MultiorgError::internal("no scripted status left")))
    }

    async fn failed_records(&self, _job: &BulkJobHandle) -> Result<Vec<FailedRecord>> {
        self.failed_calls.fetch_add(1, Ordering::SeqCst);
        self.failed_result.clone()
    }
}

enum Resolution {
    Session(Arc<FakeSession>),
    Error(MultiorgError),
}

#[derive(Default)]
pub(crate) struct FakeAuthorizer {
    orgs: HashMap<String, (Duration, Resolution)>,
    pub connect_calls: Mutex<Vec<String>>,
}

impl FakeAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, name: &str, session: Arc<FakeSession>) -> Self {
        self.with_delayed_session(name, Duration::ZERO, session)
    }

    pub fn with_delayed_session(
        mut self,
        name: &str,
        delay: Duration,
        session: Arc<FakeSession>,
    ) -> Self {
        self.orgs
            .insert(name.to_string(), (delay, Resolution::Session(session)));
        self
    }

    pub fn with_error(mut self, name: &str, error: MultiorgError) -> Self {
        self.orgs
            .insert(name.to_string(), (Duration::ZERO, Resolution::Error(error)));
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connect_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OrgAuthorizer for FakeAuthorizer {
    async fn connect(&self, name: &ConnectionName) -> Result<Arc<dyn OrgSession>> {
        self.connect_calls
            .lock()
            .unwrap()
            .push(name.as_str().to_string());

        let Some((delay, resolution)) = self.orgs.get(name.as_str()) else {
            return Err(MultiorgError::authorization(format!(
                "unknown connection '{}'",
                name
            )));
        };
        if !delay.is_zero() {
            tokio::time::sleep(*delay).await;
        }
        match resolution {
            Resolution::Session(session) => Ok(session.clone() as Arc<dyn OrgSession>),
            Resolution::Error(err) => Err(err.clone()),
        }
    }
}
