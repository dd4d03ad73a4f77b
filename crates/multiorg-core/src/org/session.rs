//! Capability traits of the external CRM collaborator.
//!
//! These are the only seams through which the query runner, the bulk
//! monitor and the bulk demo reach an org.

use super::model::{ConnectionName, OrgIdentity, QueryResponse};
use crate::bulk::{BulkJobHandle, FailedRecord, IngestRequest, JobStatusSnapshot};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves connection names to authorized org sessions.
#[async_trait]
pub trait OrgAuthorizer: Send + Sync {
    /// Resolves `name` to a session.
    ///
    /// # Returns
    ///
    /// - `Ok(session)`: The name is known and its credentials are accepted
    /// - `Err(_)`: Unknown or unauthorized name
    async fn connect(&self, name: &ConnectionName) -> Result<Arc<dyn OrgSession>>;
}

/// An authenticated handle to one org.
#[async_trait]
pub trait OrgSession: Send + Sync {
    /// Session id and username of the authenticated user.
    fn identity(&self) -> &OrgIdentity;

    /// Executes a query, passing `soql` through verbatim.
    async fn query(&self, soql: &str) -> Result<QueryResponse>;

    /// Submits an asynchronous ingest request.
    ///
    /// Returns one handle per job created by the external system.
    async fn submit_ingest(&self, request: &IngestRequest) -> Result<Vec<BulkJobHandle>>;

    /// Fetches the current status of a job.
    async fn job_status(&self, job: &BulkJobHandle) -> Result<JobStatusSnapshot>;

    /// Fetches the records a completed job could not process.
    async fn failed_records(&self, job: &BulkJobHandle) -> Result<Vec<FailedRecord>>;
}
