use super::client::SalesforceClient;
use async_trait::async_trait;
use multiorg_core::Result;
use multiorg_core::bulk::{BulkJobHandle, FailedRecord, IngestRequest, JobStatusSnapshot};
use multiorg_core::org::{OrgIdentity, OrgSession, QueryResponse};

/// `OrgSession` backed by the Salesforce REST and Bulk API v2 endpoints.
pub struct RestOrgSession {
    client: SalesforceClient,
    identity: OrgIdentity,
}

impl RestOrgSession {
    pub fn new(client: SalesforceClient, identity: OrgIdentity) -> Self {
        Self { client, identity }
    }
}

#[async_trait]
impl OrgSession for RestOrgSession {
    fn identity(&self) -> &OrgIdentity {
        &self.identity
    }

    async fn query(&self, soql: &str) -> Result<QueryResponse> {
        self.client.query(soql).await
    }

    /// Creates the job, uploads the CSV and closes it (`UploadComplete`).
    ///
    /// If the upload or close step fails the job is aborted (best-effort)
    /// and the upload error is returned.
    async fn submit_ingest(&self, request: &IngestRequest) -> Result<Vec<BulkJobHandle>> {
        request.validate()?;

        let job = self.client.create_ingest_job(request).await?;
        tracing::info!(
            target: "salesforce",
            "Created ingest job {} ({} {} rows into {})",
            job.id,
            request.operation.as_str(),
            request.data.len(),
            job.object
        );

        let uploaded = match self.client.upload_job_data(&job.id, request).await {
            Ok(()) => self.client.set_job_state(&job.id, "UploadComplete").await,
            Err(e) => Err(e),
        };

        if let Err(e) = uploaded {
            tracing::warn!(
                target: "salesforce",
                "Aborting ingest job {} after failed upload: {}",
                job.id,
                e
            );
            if let Err(abort_err) = self.client.set_job_state(&job.id, "Aborted").await {
                tracing::warn!(target: "salesforce", "Failed to abort job {}: {}", job.id, abort_err);
            }
            return Err(e);
        }

        Ok(vec![BulkJobHandle {
            id: job.id,
            object: job.object,
        }])
    }

    async fn job_status(&self, job: &BulkJobHandle) -> Result<JobStatusSnapshot> {
        self.client.job_status(&job.id).await
    }

    async fn failed_records(&self, job: &BulkJobHandle) -> Result<Vec<FailedRecord>> {
        self.client.failed_results(&job.id).await
    }
}
