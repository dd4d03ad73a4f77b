//! Configuration model.
//!
//! `AppConfig` mirrors `config.toml`; `SecretConfig` mirrors `secret.json`.
//! Both are plain values handed to the components that need them.

use crate::org::ConnectionSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default read query issued by the fan-out runner.
pub const DEFAULT_ACCOUNT_SOQL: &str = "SELECT Id, Name FROM Account ORDER BY Name LIMIT 10";

/// Default object targeted by the bulk demo.
pub const DEFAULT_BULK_OBJECT: &str = "Account";

/// Default query used to decide whether demo records already exist.
pub const DEFAULT_GUARD_SOQL: &str =
    "SELECT Id FROM Account WHERE Name LIKE 'Bulk Demo%' LIMIT 1";

/// Default poll interval of the bulk job monitor.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Connection names, in presentation order.
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
}

impl AppConfig {
    /// Returns the configured connections as an immutable set.
    pub fn connection_set(&self) -> ConnectionSet {
        ConnectionSet::from_names(self.connections.iter().map(String::as_str))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct QueryConfig {
    #[serde(default = "default_account_soql")]
    pub soql: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            soql: default_account_soql(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on total monitoring time. `None` polls until a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_secs: Option<u64>,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_wait_secs: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BulkConfig {
    #[serde(default = "default_bulk_object")]
    pub object: String,
    #[serde(default = "default_guard_soql")]
    pub guard_soql: String,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            object: default_bulk_object(),
            guard_soql: default_guard_soql(),
        }
    }
}

fn default_account_soql() -> String {
    DEFAULT_ACCOUNT_SOQL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_bulk_object() -> String {
    DEFAULT_BULK_OBJECT.to_string()
}

fn default_guard_soql() -> String {
    DEFAULT_GUARD_SOQL.to_string()
}

/// Credentials for every pre-authorized org, keyed by connection name.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub orgs: BTreeMap<String, OrgCredentials>,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct OrgCredentials {
    /// e.g. `https://acme.my.salesforce.com`
    pub instance_url: String,
    pub access_token: String,
    /// e.g. `v60.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

// Tokens must never reach the logs.
impl std::fmt::Debug for OrgCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}
