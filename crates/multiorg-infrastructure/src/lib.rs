pub mod config_service;
pub mod paths;
pub mod salesforce;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::{MultiorgPaths, ensure_secret_template};
pub use crate::salesforce::{CredentialAuthorizer, RestOrgSession};
