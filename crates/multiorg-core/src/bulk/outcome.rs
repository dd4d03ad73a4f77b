use super::model::{BulkJobState, FailedRecord};
use serde::Serialize;

/// How one run of the bulk job monitor ended.
///
/// A partially failed job is not an error: the records that were accepted
/// remain in the org and can be queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MonitorOutcome {
    /// `JobComplete` with no failed records.
    Completed { processed: u64 },
    /// `JobComplete` with failed records; `records` is the fetched detail.
    PartiallyFailed {
        processed: u64,
        failed: u64,
        records: Vec<FailedRecord>,
    },
    /// The job ended in `Failed` or `Aborted`.
    Terminated {
        state: BulkJobState,
        processed: u64,
        failed: u64,
        error_message: Option<String>,
    },
    /// Polling or fetching failed-record detail failed. The monitor does not retry.
    PollError { message: String },
    /// Stopped by the cancellation signal while waiting.
    Cancelled { polls: u32 },
    /// The configured maximum wait elapsed before a terminal state.
    TimedOut { polls: u32 },
}
