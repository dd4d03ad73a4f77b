//! Low-level Salesforce REST and Bulk API v2 client for one org.

use super::csv_codec::{decode_failed_records, encode_rows};
use super::error::{map_http_error, map_request_error};
use multiorg_core::bulk::{FailedRecord, IngestRequest, JobStatusSnapshot};
use multiorg_core::config::OrgCredentials;
use multiorg_core::org::QueryResponse;
use multiorg_core::{MultiorgError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

/// REST API version used when the credentials do not pin one.
pub const DEFAULT_API_VERSION: &str = "v60.0";

/// Upper bound on followed `nextRecordsUrl` pages for one query.
const MAX_QUERY_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfo {
    pub organization_id: String,
    pub user_id: String,
    pub preferred_username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIngestJobRequest<'a> {
    object: &'a str,
    operation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id_field_name: Option<&'a str>,
    content_type: &'a str,
    line_ending: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IngestJobInfo {
    pub id: String,
    pub object: String,
}

#[derive(Serialize)]
struct JobStateUpdate<'a> {
    state: &'a str,
}

/// HTTP client bound to one org's instance URL and access token.
#[derive(Clone)]
pub struct SalesforceClient {
    http: Client,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl SalesforceClient {
    pub fn new(http: Client, credentials: &OrgCredentials) -> Self {
        Self {
            http,
            instance_url: credentials.instance_url.trim_end_matches('/').to_string(),
            access_token: credentials.access_token.clone(),
            api_version: credentials
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        }
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub(crate) fn data_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/{}{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Resolves a server-relative path such as `nextRecordsUrl`.
    pub(crate) fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.instance_url, path)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Salesforce error body".to_string());
            return Err(map_http_error(status, &body));
        }

        Ok(response)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|err| MultiorgError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to parse Salesforce response: {err}"),
            })
    }

    pub(crate) async fn userinfo(&self) -> Result<UserInfo> {
        let url = format!("{}/services/oauth2/userinfo", self.instance_url);
        tracing::debug!(target: "salesforce", "GET {}", url);
        self.send_json(self.http.get(url)).await
    }

    /// Runs a SOQL query and follows `nextRecordsUrl` until `done`.
    ///
    /// A result spanning more than [`MAX_QUERY_PAGES`] pages is a query error.
    pub async fn query(&self, soql: &str) -> Result<QueryResponse> {
        let url = self.data_url("/query");
        tracing::debug!(target: "salesforce", "GET {} ({} chars of SOQL)", url, soql.len());

        let mut response: QueryResponse = self
            .send_json(self.http.get(url).query(&[("q", soql)]))
            .await
            .map_err(as_query_error)?;

        let mut pages = 1;
        while !response.done {
            let Some(next) = response.next_records_url.take() else {
                break;
            };
            check_page_limit(pages, &response)?;

            let page: QueryResponse = self
                .send_json(self.http.get(self.absolute_url(&next)))
                .await
                .map_err(as_query_error)?;
            response.records.extend(page.records);
            response.done = page.done;
            response.next_records_url = page.next_records_url;
            pages += 1;
        }

        Ok(response)
    }

    pub(crate) async fn create_ingest_job(&self, request: &IngestRequest) -> Result<IngestJobInfo> {
        let body = CreateIngestJobRequest {
            object: &request.object,
            operation: request.operation.as_str(),
            external_id_field_name: request.external_id_field.as_deref(),
            content_type: "CSV",
            line_ending: "LF",
        };
        let url = self.data_url("/jobs/ingest");
        tracing::debug!(target: "salesforce", "POST {} ({})", url, request.object);
        self.send_json(self.http.post(url).json(&body)).await
    }

    pub(crate) async fn upload_job_data(&self, job_id: &str, request: &IngestRequest) -> Result<()> {
        let csv = encode_rows(&request.data)?;
        let url = self.data_url(&format!("/jobs/ingest/{job_id}/batches"));
        tracing::debug!(target: "salesforce", "PUT {} ({} rows)", url, request.data.len());
        self.send(
            self.http
                .put(url)
                .header(reqwest::header::CONTENT_TYPE, "text/csv")
                .body(csv),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn set_job_state(&self, job_id: &str, state: &str) -> Result<()> {
        let url = self.data_url(&format!("/jobs/ingest/{job_id}"));
        tracing::debug!(target: "salesforce", "PATCH {} -> {}", url, state);
        self.send(self.http.patch(url).json(&JobStateUpdate { state }))
            .await?;
        Ok(())
    }

    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusSnapshot> {
        let url = self.data_url(&format!("/jobs/ingest/{job_id}"));
        tracing::debug!(target: "salesforce", "GET {}", url);
        self.send_json(self.http.get(url)).await
    }

    pub async fn failed_results(&self, job_id: &str) -> Result<Vec<FailedRecord>> {
        let url = self.data_url(&format!("/jobs/ingest/{job_id}/failedResults/"));
        tracing::debug!(target: "salesforce", "GET {}", url);
        let body = self
            .send(self.http.get(url))
            .await?
            .text()
            .await
            .map_err(map_request_error)?;
        decode_failed_records(&body)
    }
}

fn check_page_limit(pages: usize, response: &QueryResponse) -> Result<()> {
    if pages < MAX_QUERY_PAGES {
        return Ok(());
    }
    Err(MultiorgError::query(format!(
        "query spans more than {} pages ({} of {} records fetched); add a LIMIT",
        MAX_QUERY_PAGES,
        response.records.len(),
        response.total_size
    )))
}

// A rejected query (400) is a query error; everything else keeps its category.
fn as_query_error(err: MultiorgError) -> MultiorgError {
    match err {
        MultiorgError::Transport {
            status_code: Some(400),
            message,
        } => MultiorgError::Query(message),
        other => other,
    }
}
