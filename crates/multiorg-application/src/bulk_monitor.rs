//! Background polling of Bulk API ingest jobs.
//!
//! A monitor polls the job status on a fixed interval until the job reaches
//! a terminal state, then logs a summary (and, for partial failures, the
//! failed-record detail). Every wait and every request races the
//! cancellation token, so a host shutdown stops monitors promptly.

use chrono::{DateTime, Utc};
use multiorg_core::bulk::{BulkJobHandle, BulkJobState, JobStatusSnapshot, MonitorOutcome};
use multiorg_core::config::{DEFAULT_POLL_INTERVAL_SECS, MonitorConfig};
use multiorg_core::org::OrgSession;
use multiorg_core::{MultiorgError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Polling cadence and optional upper bound on how long to watch one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPolicy {
    pub poll_interval: Duration,
    pub max_wait: Option<Duration>,
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: None,
        }
    }
}

impl From<&MonitorConfig> for MonitorPolicy {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_wait: config.max_wait(),
        }
    }
}

pub struct BulkJobMonitor {
    policy: MonitorPolicy,
}

impl BulkJobMonitor {
    pub fn new(policy: MonitorPolicy) -> Self {
        Self { policy }
    }

    /// Watches `job` until it finishes, polling fails, the wait bound is
    /// exceeded or `cancel` fires.
    ///
    /// The first poll happens immediately. Poll errors are terminal; there
    /// is no retry.
    pub async fn monitor(
        &self,
        session: &dyn OrgSession,
        job: &BulkJobHandle,
        cancel: CancellationToken,
    ) -> MonitorOutcome {
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let snapshot = match until_cancelled(&cancel, session.job_status(job)).await {
                None => return cancelled(job, polls),
                Some(Ok(snapshot)) => snapshot,
                Some(Err(e)) => {
                    tracing::error!(
                        target: "bulk_monitor",
                        "Failed to poll bulk job {}: {}",
                        job.id,
                        e
                    );
                    return MonitorOutcome::PollError {
                        message: e.message().to_string(),
                    };
                }
            };

            tracing::debug!(
                target: "bulk_monitor",
                "Bulk job {} poll #{}: state={}, processed={}, failed={}",
                job.id,
                polls,
                snapshot.state,
                snapshot.number_records_processed,
                snapshot.number_records_failed
            );

            if snapshot.state.is_terminal() {
                return self.finalize(session, job, snapshot, &cancel, polls).await;
            }

            if let Some(max_wait) = self.policy.max_wait {
                if started.elapsed() + self.policy.poll_interval > max_wait {
                    tracing::warn!(
                        target: "bulk_monitor",
                        "Bulk job {} still {} after {:?}, giving up after {} poll(s)",
                        job.id,
                        snapshot.state,
                        started.elapsed(),
                        polls
                    );
                    return MonitorOutcome::TimedOut { polls };
                }
            }

            if until_cancelled(&cancel, tokio::time::sleep(self.policy.poll_interval))
                .await
                .is_none()
            {
                return cancelled(job, polls);
            }
        }
    }

    async fn finalize(
        &self,
        session: &dyn OrgSession,
        job: &BulkJobHandle,
        snapshot: JobStatusSnapshot,
        cancel: &CancellationToken,
        polls: u32,
    ) -> MonitorOutcome {
        let processed = snapshot.number_records_processed;
        let failed = snapshot.number_records_failed;

        if snapshot.state != BulkJobState::JobComplete {
            tracing::error!(
                target: "bulk_monitor",
                "Bulk job {} ended in state {}: {}",
                job.id,
                snapshot.state,
                snapshot.error_message.as_deref().unwrap_or("no error message")
            );
            return MonitorOutcome::Terminated {
                state: snapshot.state,
                processed,
                failed,
                error_message: snapshot.error_message,
            };
        }

        if failed == 0 {
            tracing::info!(
                target: "bulk_monitor",
                "Bulk job {} complete: {} record(s) processed",
                job.id,
                processed
            );
            return MonitorOutcome::Completed { processed };
        }

        tracing::warn!(
            target: "bulk_monitor",
            "Bulk job {} complete with {} of {} record(s) failed",
            job.id,
            failed,
            processed
        );

        match until_cancelled(cancel, session.failed_records(job)).await {
            None => cancelled(job, polls),
            Some(Ok(records)) => {
                for record in &records {
                    tracing::warn!(
                        target: "bulk_monitor",
                        "Bulk job {} failed record {}: {} {:?}",
                        job.id,
                        record.sf_id.as_deref().unwrap_or("-"),
                        record.sf_error,
                        record.fields
                    );
                }
                MonitorOutcome::PartiallyFailed {
                    processed,
                    failed,
                    records,
                }
            }
            Some(Err(e)) => {
                tracing::error!(
                    target: "bulk_monitor",
                    "Failed to fetch failed records for bulk job {}: {}",
                    job.id,
                    e
                );
                MonitorOutcome::PollError {
                    message: e.message().to_string(),
                }
            }
        }
    }

    /// Starts monitoring on the runtime and returns without waiting.
    pub fn spawn(self: &Arc<Self>, session: Arc<dyn OrgSession>, job: BulkJobHandle) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.clone().run(session, job.clone(), cancel.clone()));
        MonitorHandle::new(job, cancel, task)
    }

    fn run(
        self: Arc<Self>,
        session: Arc<dyn OrgSession>,
        job: BulkJobHandle,
        cancel: CancellationToken,
    ) -> impl Future<Output = MonitorOutcome> + Send + 'static {
        let span = tracing::info_span!("bulk_monitor", job_id = %job.id);
        async move {
            tracing::info!(
                target: "bulk_monitor",
                "Monitoring bulk job {} ({}) every {:?}",
                job.id,
                job.object,
                self.policy.poll_interval
            );
            self.monitor(session.as_ref(), &job, cancel).await
        }
        .instrument(span)
    }
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    job: BulkJobHandle,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    task: JoinHandle<MonitorOutcome>,
}

impl MonitorHandle {
    fn new(job: BulkJobHandle, cancel: CancellationToken, task: JoinHandle<MonitorOutcome>) -> Self {
        Self {
            job,
            started_at: Utc::now(),
            cancel,
            task,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Asks this monitor to stop. It resolves with `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the monitor to produce its outcome.
    pub async fn join(self) -> Result<MonitorOutcome> {
        self.task.await.map_err(|e| {
            MultiorgError::internal(format!("Monitor for bulk job {} panicked: {e}", self.job.id))
        })
    }
}

/// Owns every monitor started by the host so they can be stopped together.
pub struct MonitorSupervisor {
    monitor: Arc<BulkJobMonitor>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl MonitorSupervisor {
    pub fn new(monitor: Arc<BulkJobMonitor>) -> Self {
        Self {
            monitor,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Starts a monitor whose cancellation is tied to [`Self::shutdown`].
    pub fn spawn(&self, session: Arc<dyn OrgSession>, job: BulkJobHandle) -> MonitorHandle {
        let cancel = self.shutdown.child_token();
        let task = self
            .tracker
            .spawn(self.monitor.clone().run(session, job.clone(), cancel.clone()));
        MonitorHandle::new(job, cancel, task)
    }

    /// Number of monitors still running.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Cancels every monitor and waits for all of them to exit.
    pub async fn shutdown(&self) {
        let active = self.tracker.len();
        if active > 0 {
            tracing::info!(target: "bulk_monitor", "Stopping {} bulk job monitor(s)", active);
        }
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        output = future => Some(output),
    }
}

fn cancelled(job: &BulkJobHandle, polls: u32) -> MonitorOutcome {
    tracing::info!(
        target: "bulk_monitor",
        "Stopped monitoring bulk job {} after {} poll(s)",
        job.id,
        polls
    );
    MonitorOutcome::Cancelled { polls }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSession, LogCapture};
    use multiorg_core::bulk::FailedRecord;
    use std::collections::BTreeMap;

    fn job() -> BulkJobHandle {
        BulkJobHandle {
            id: "750xx0000000001".to_string(),
            object: "Account".to_string(),
        }
    }

    fn status(state: BulkJobState, processed: u64, failed: u64) -> Result<JobStatusSnapshot> {
        Ok(JobStatusSnapshot::new(state, processed, failed))
    }

    fn monitor(interval_secs: u64, max_wait_secs: Option<u64>) -> BulkJobMonitor {
        BulkJobMonitor::new(MonitorPolicy {
            poll_interval: Duration::from_secs(interval_secs),
            max_wait: max_wait_secs.map(Duration::from_secs),
        })
    }

    fn failed_record(error: &str) -> FailedRecord {
        FailedRecord {
            sf_id: None,
            sf_error: error.to_string(),
            fields: BTreeMap::from([("Name".to_string(), String::new())]),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_complete_and_stops() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let session = FakeSession::new("A").with_statuses(vec![
            status(BulkJobState::UploadComplete, 0, 0),
            status(BulkJobState::InProgress, 4, 0),
            status(BulkJobState::JobComplete, 10, 0),
        ]);

        let started = Instant::now();
        let outcome = monitor(5, None)
            .monitor(&session, &job(), CancellationToken::new())
            .await;

        assert_eq!(outcome, MonitorOutcome::Completed { processed: 10 });
        assert_eq!(session.status_calls(), 3);
        assert_eq!(session.failed_calls(), 0);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(logs.count("complete: 10 record(s) processed"), 1);
        assert_eq!(logs.count(" ERROR "), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_fetches_records_once() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let session = FakeSession::new("A")
            .with_statuses(vec![
                status(BulkJobState::InProgress, 1, 0),
                status(BulkJobState::JobComplete, 10, 2),
            ])
            .with_failed_records(Ok(vec![
                failed_record("REQUIRED_FIELD_MISSING:Required fields are missing: [Name]"),
                failed_record("DUPLICATE_VALUE:duplicate value found"),
            ]));

        let outcome = monitor(5, None)
            .monitor(&session, &job(), CancellationToken::new())
            .await;

        match outcome {
            MonitorOutcome::PartiallyFailed {
                processed,
                failed,
                records,
            } => {
                assert_eq!(processed, 10);
                assert_eq!(failed, 2);
                assert_eq!(records.len(), 2);
            }
            other => panic!("Expected PartiallyFailed, got {other:?}"),
        }
        assert_eq!(session.failed_calls(), 1);
        assert_eq!(session.status_calls(), 2);
        assert_eq!(logs.count("complete with 2 of 10 record(s) failed"), 1);
        assert_eq!(logs.count("REQUIRED_FIELD_MISSING"), 1);
        assert_eq!(logs.count("DUPLICATE_VALUE"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_record_fetch_error_is_poll_error() {
        let session = FakeSession::new("A")
            .with_statuses(vec![status(BulkJobState::JobComplete, 3, 1)])
            .with_failed_records(Err(MultiorgError::transport(Some(500), "server error")));

        let outcome = monitor(5, None)
            .monitor(&session, &job(), CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            MonitorOutcome::PollError {
                message: "server error".to_string()
            }
        );
        assert_eq!(session.failed_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_and_aborted_jobs_terminate() {
        for state in [BulkJobState::Failed, BulkJobState::Aborted] {
            let mut snapshot = JobStatusSnapshot::new(state, 0, 0);
            snapshot.error_message = Some("InvalidBatch : Field name not found".to_string());
            let session = FakeSession::new("A").with_statuses(vec![
                status(BulkJobState::InProgress, 0, 0),
                Ok(snapshot),
            ]);

            let outcome = monitor(5, None)
                .monitor(&session, &job(), CancellationToken::new())
                .await;

            assert_eq!(
                outcome,
                MonitorOutcome::Terminated {
                    state,
                    processed: 0,
                    failed: 0,
                    error_message: Some("InvalidBatch : Field name not found".to_string()),
                }
            );
            assert_eq!(session.status_calls(), 2);
            assert_eq!(session.failed_calls(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_stops_without_retry() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let session = FakeSession::new("A").with_statuses(vec![
            status(BulkJobState::InProgress, 0, 0),
            Err(MultiorgError::transport(None, "connection reset")),
            status(BulkJobState::JobComplete, 10, 0),
        ]);

        let outcome = monitor(5, None)
            .monitor(&session, &job(), CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            MonitorOutcome::PollError {
                message: "connection reset".to_string()
            }
        );
        assert_eq!(session.status_calls(), 2);
        assert_eq!(logs.count("Failed to poll bulk job 750xx0000000001"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_bounds_the_loop() {
        let session = FakeSession::new("A").with_statuses(vec![
            status(BulkJobState::InProgress, 0, 0),
            status(BulkJobState::InProgress, 0, 0),
            status(BulkJobState::InProgress, 0, 0),
            status(BulkJobState::InProgress, 0, 0),
        ]);

        let outcome = monitor(5, Some(12))
            .monitor(&session, &job(), CancellationToken::new())
            .await;

        // Polls at 0s, 5s and 10s; the next one would land past 12s.
        assert_eq!(outcome, MonitorOutcome::TimedOut { polls: 3 });
        assert_eq!(session.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_the_wait() {
        let session = Arc::new(FakeSession::new("A").with_statuses(vec![
            status(BulkJobState::InProgress, 0, 0),
            status(BulkJobState::InProgress, 0, 0),
        ]));
        let monitor = Arc::new(monitor(60, None));

        let handle = monitor.spawn(session.clone(), job());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.status_calls(), 1);

        handle.cancel();
        let outcome = handle.join().await.unwrap();
        assert_eq!(outcome, MonitorOutcome::Cancelled { polls: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_returns_before_first_poll_completes() {
        let session = Arc::new(
            FakeSession::new("A").with_statuses(vec![status(BulkJobState::JobComplete, 1, 0)]),
        );
        let monitor = Arc::new(monitor(5, None));

        let handle = monitor.spawn(session.clone(), job());
        assert_eq!(session.status_calls(), 0);
        assert_eq!(handle.job_id(), "750xx0000000001");
        assert!(handle.started_at() <= Utc::now());

        let outcome = handle.join().await.unwrap();
        assert_eq!(outcome, MonitorOutcome::Completed { processed: 1 });
        assert_eq!(session.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervisor_shutdown_cancels_all_monitors() {
        let supervisor = MonitorSupervisor::new(Arc::new(monitor(30, None)));
        let first = Arc::new(FakeSession::new("A").with_statuses(vec![
            status(BulkJobState::InProgress, 0, 0),
        ]));
        let second = Arc::new(FakeSession::new("B").with_statuses(vec![
            status(BulkJobState::Open, 0, 0),
        ]));

        let a = supervisor.spawn(first, job());
        let b = supervisor.spawn(second, job());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(supervisor.active(), 2);

        supervisor.shutdown().await;

        assert_eq!(supervisor.active(), 0);
        assert_eq!(a.join().await.unwrap(), MonitorOutcome::Cancelled { polls: 1 });
        assert_eq!(b.join().await.unwrap(), MonitorOutcome::Cancelled { polls: 1 });
    }

    #[test]
    fn test_policy_from_config() {
        let config = MonitorConfig {
            poll_interval_secs: 2,
            max_wait_secs: Some(600),
        };
        let policy = MonitorPolicy::from(&config);
        assert_eq!(policy.poll_interval, Duration::from_secs(2));
        assert_eq!(policy.max_wait, Some(Duration::from_secs(600)));

        assert_eq!(MonitorPolicy::default().poll_interval, Duration::from_secs(5));
        assert_eq!(MonitorPolicy::default().max_wait, None);
    }
}
