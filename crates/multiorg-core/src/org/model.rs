use crate::error::{MultiorgError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Alias of one pre-authorized org session.
///
/// Names are trimmed on construction; nothing else is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionName(String);

impl ConnectionName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ConnectionName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// An immutable, ordered list of connection names.
///
/// Duplicates are preserved: a name listed twice is queried twice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionSet {
    names: Arc<[ConnectionName]>,
}

impl ConnectionSet {
    pub fn new(names: Vec<ConnectionName>) -> Self {
        Self {
            names: names.into(),
        }
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(names.into_iter().map(ConnectionName::new).collect())
    }

    /// Parses a comma-separated list (e.g. `"org-a, org-b"`).
    ///
    /// An empty or whitespace-only input yields an empty set.
    pub fn parse_list(list: &str) -> Self {
        if list.trim().is_empty() {
            return Self::default();
        }
        Self::from_names(list.split(','))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionName> {
        self.names.iter()
    }

    pub fn as_slice(&self) -> &[ConnectionName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Identity of a resolved org session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgIdentity {
    /// Session (org) identifier.
    pub id: String,
    /// Authenticated user's username.
    pub username: String,
}

/// One record returned by the query engine, as a bag of fields.
///
/// The `attributes` entry Salesforce attaches to every record is dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Record {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(mut fields: Map<String, Value>) -> Self {
        fields.remove("attributes");
        Self { fields }
    }
}

/// Result page of a query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub total_size: u64,
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
}

/// The projected row shown for each account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Id")]
    pub id: String,
}

impl AccountRow {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Projects a record onto its `Name` and `Id` fields, dropping the rest.
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            name: string_field(record, "Name")?,
            id: string_field(record, "Id")?,
        })
    }
}

fn string_field(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(MultiorgError::malformed_record(format!(
            "field '{}' is not a string: {}",
            field, other
        ))),
        None => Err(MultiorgError::malformed_record(format!(
            "field '{}' is missing",
            field
        ))),
    }
}

/// What one connection produced for a fan-out query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    Success {
        connection_name: ConnectionName,
        accounts: Vec<AccountRow>,
    },
    Failure {
        connection_name: ConnectionName,
        error: String,
    },
}

impl ConnectionOutcome {
    pub fn from_result(connection_name: ConnectionName, result: Result<Vec<AccountRow>>) -> Self {
        match result {
            Ok(accounts) => Self::Success {
                connection_name,
                accounts,
            },
            Err(err) => Self::Failure {
                connection_name,
                error: err.message().to_string(),
            },
        }
    }

    pub fn connection_name(&self) -> &ConnectionName {
        match self {
            Self::Success {
                connection_name, ..
            }
            | Self::Failure {
                connection_name, ..
            } => connection_name,
        }
    }

    /// Accounts of a successful outcome; empty for a failure.
    pub fn accounts(&self) -> &[AccountRow] {
        match self {
            Self::Success { accounts, .. } => accounts,
            Self::Failure { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// Presentation shape: `{connectionName, accounts}` or `{connectionName, accounts: [], error}`.
impl Serialize for ConnectionOutcome {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("connectionName", self.connection_name())?;
        map.serialize_entry("accounts", self.accounts())?;
        if let Some(error) = self.error() {
            map.serialize_entry("error", error)?;
        }
        map.end()
    }
}
