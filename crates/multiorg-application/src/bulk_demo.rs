//! Guarded bulk insert into one connection, monitored in the background.

use crate::bulk_monitor::{MonitorHandle, MonitorSupervisor};
use multiorg_core::bulk::{IngestRequest, TabularData};
use multiorg_core::config::BulkConfig;
use multiorg_core::org::{ConnectionName, OrgAuthorizer};
use multiorg_core::{MultiorgError, Result};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDemoSettings {
    /// Target sObject.
    pub object: String,
    /// Query that returns rows when the demo data is already present.
    pub guard_soql: String,
}

impl From<&BulkConfig> for BulkDemoSettings {
    fn from(config: &BulkConfig) -> Self {
        Self {
            object: config.object.clone(),
            guard_soql: config.guard_soql.clone(),
        }
    }
}

pub enum BulkDemoStart {
    /// The guard query found existing rows; nothing was submitted.
    Skipped { existing: u64 },
    /// A job was submitted and is being monitored.
    Submitted {
        job_id: String,
        monitor: MonitorHandle,
    },
}

pub struct BulkDemoUseCase {
    authorizer: Arc<dyn OrgAuthorizer>,
    supervisor: Arc<MonitorSupervisor>,
    settings: BulkDemoSettings,
}

impl BulkDemoUseCase {
    pub fn new(
        authorizer: Arc<dyn OrgAuthorizer>,
        supervisor: Arc<MonitorSupervisor>,
        settings: BulkDemoSettings,
    ) -> Self {
        Self {
            authorizer,
            supervisor,
            settings,
        }
    }

    /// Inserts `data` unless the guard query already matches.
    ///
    /// Returns as soon as the job is submitted; the monitor keeps running
    /// under the supervisor.
    pub async fn start(
        &self,
        connection: &ConnectionName,
        data: TabularData,
    ) -> Result<BulkDemoStart> {
        let session = self.authorizer.connect(connection).await?;

        let existing = session.query(&self.settings.guard_soql).await?;
        if existing.total_size > 0 {
            tracing::info!(
                target: "bulk_demo",
                "'{}' already has {} matching record(s), skipping bulk insert",
                connection,
                existing.total_size
            );
            return Ok(BulkDemoStart::Skipped {
                existing: existing.total_size,
            });
        }

        let request = IngestRequest::insert(self.settings.object.clone(), data);
        let job = session
            .submit_ingest(&request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MultiorgError::bulk("ingest submission returned no job"))?;

        tracing::info!(
            target: "bulk_demo",
            "Submitted bulk job {} to '{}' ({} row(s) into {})",
            job.id,
            connection,
            request.data.len(),
            job.object
        );

        let job_id = job.id.clone();
        let monitor = self.supervisor.spawn(session, job);
        Ok(BulkDemoStart::Submitted { job_id, monitor })
    }
}
