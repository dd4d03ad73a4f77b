use crate::error::{MultiorgError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of write performed by an ingest job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation {
    Insert,
    Update,
    Upsert,
    Delete,
    HardDelete,
}

impl BulkOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkOperation::Insert => "insert",
            BulkOperation::Update => "update",
            BulkOperation::Upsert => "upsert",
            BulkOperation::Delete => "delete",
            BulkOperation::HardDelete => "hardDelete",
        }
    }
}

/// Column-ordered rows handed to an ingest job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularData {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularData {
    /// Builds a table, rejecting empty headers and ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(MultiorgError::bulk("ingest data has no columns"));
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(MultiorgError::bulk(format!(
                "row {} has {} cells, expected {}",
                index + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A request to ingest tabular data into one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub object: String,
    pub operation: BulkOperation,
    /// Required for `upsert`.
    pub external_id_field: Option<String>,
    pub data: TabularData,
}

impl IngestRequest {
    pub fn insert(object: impl Into<String>, data: TabularData) -> Self {
        Self {
            object: object.into(),
            operation: BulkOperation::Insert,
            external_id_field: None,
            data,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.object.trim().is_empty() {
            return Err(MultiorgError::bulk("ingest object name is empty"));
        }
        if self.operation == BulkOperation::Upsert && self.external_id_field.is_none() {
            return Err(MultiorgError::bulk(
                "upsert requires an external id field",
            ));
        }
        Ok(())
    }
}

/// Reference to a submitted ingest job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkJobHandle {
    pub id: String,
    pub object: String,
}

/// State of a Bulk API v2 ingest job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkJobState {
    /// Job has been created but data is not yet uploaded.
    Open,
    /// Data has been uploaded, job is queued for processing.
    UploadComplete,
    InProgress,
    JobComplete,
    Failed,
    Aborted,
    /// Catch-all for states this client does not know.
    #[serde(other)]
    Unknown,
}

impl BulkJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkJobState::Open => "Open",
            BulkJobState::UploadComplete => "UploadComplete",
            BulkJobState::InProgress => "InProgress",
            BulkJobState::JobComplete => "JobComplete",
            BulkJobState::Failed => "Failed",
            BulkJobState::Aborted => "Aborted",
            BulkJobState::Unknown => "Unknown",
        }
    }

    /// Returns true if the job cannot transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BulkJobState::JobComplete | BulkJobState::Failed | BulkJobState::Aborted
        )
    }
}

impl std::fmt::Display for BulkJobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest polled status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusSnapshot {
    pub state: BulkJobState,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobStatusSnapshot {
    pub fn new(state: BulkJobState, processed: u64, failed: u64) -> Self {
        Self {
            state,
            number_records_processed: processed,
            number_records_failed: failed,
            error_message: None,
        }
    }
}

/// One record a job failed to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRecord {
    /// Id assigned by the org, usually empty for failed inserts.
    pub sf_id: Option<String>,
    pub sf_error: String,
    /// The submitted columns of the failed row.
    pub fields: BTreeMap<String, String>,
}
