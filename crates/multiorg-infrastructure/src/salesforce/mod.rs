//! Salesforce adapter for the org capability traits.
//!
//! - `CredentialAuthorizer` resolves connection names using secret.json credentials
//! - `RestOrgSession` runs SOQL over the REST API and ingest jobs over Bulk API v2
//! - `SalesforceClient` is the HTTP layer shared by both

mod authorizer;
mod client;
mod csv_codec;
mod error;
mod session;

pub use authorizer::CredentialAuthorizer;
pub use client::{DEFAULT_API_VERSION, SalesforceClient};
pub use session::RestOrgSession;
