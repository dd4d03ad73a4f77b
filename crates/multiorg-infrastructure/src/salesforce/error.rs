//! Mapping of Salesforce HTTP failures onto `MultiorgError`.

use multiorg_core::MultiorgError;
use reqwest::StatusCode;
use serde::Deserialize;

/// REST API error entry (`[{"message": .., "errorCode": ..}]`).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorEntry {
    message: String,
    #[allow(dead_code)]
    error_code: Option<String>,
}

/// OAuth error body (`{"error": .., "error_description": ..}`).
#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[allow(dead_code)]
    error_description: Option<String>,
}

/// Extracts the most specific message Salesforce put in an error body.
pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(entries) = serde_json::from_str::<Vec<ApiErrorEntry>>(body) {
        if let Some(first) = entries.into_iter().next() {
            return first.message;
        }
    }
    if let Ok(oauth) = serde_json::from_str::<OAuthErrorBody>(body) {
        return oauth.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty error response".to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn map_http_error(status: StatusCode, body: &str) -> MultiorgError {
    let message = extract_error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MultiorgError::authorization(message),
        _ => MultiorgError::transport(Some(status.as_u16()), message),
    }
}

pub(crate) fn map_request_error(err: reqwest::Error) -> MultiorgError {
    MultiorgError::transport(
        err.status().map(|s| s.as_u16()),
        format!("Salesforce request failed: {err}"),
    )
}
