//! Bulk ingest jobs and their monitoring outcomes.

pub mod model;
pub mod outcome;

pub use model::{
    BulkJobHandle, BulkJobState, BulkOperation, FailedRecord, IngestRequest, JobStatusSnapshot,
    TabularData,
};
pub use outcome::MonitorOutcome;
