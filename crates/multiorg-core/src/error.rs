//! Error types for multiorg.

use thiserror::Error;

/// A shared error type for the entire multiorg workspace.
///
/// Each variant keeps the raw message reported by the failing collaborator so
/// that callers presenting errors to users (see [`MultiorgError::message`])
/// can show exactly what the external system said, e.g. `invalid_grant`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultiorgError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection could not be resolved to an authorized session
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),

    /// Bulk ingest submission or job inspection error
    #[error("Bulk error: {0}")]
    Bulk(String),

    /// A returned record did not carry the expected fields
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// HTTP transport error talking to the external system
    #[error("Transport error{}: {message}", .status_code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Transport {
        status_code: Option<u16>,
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "CSV"
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MultiorgError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    /// Creates a Query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Creates a Bulk error
    pub fn bulk(message: impl Into<String>) -> Self {
        Self::Bulk(message.into())
    }

    /// Creates a MalformedRecord error
    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord(message.into())
    }

    /// Creates a Transport error
    pub fn transport(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status_code,
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Returns the raw message without the category prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Authorization(m)
            | Self::Query(m)
            | Self::Bulk(m)
            | Self::MalformedRecord(m)
            | Self::Internal(m) => m,
            Self::Transport { message, .. }
            | Self::Io { message }
            | Self::Serialization { message, .. } => message,
        }
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MultiorgError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MultiorgError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MultiorgError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MultiorgError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MultiorgError>`.
pub type Result<T> = std::result::Result<T, MultiorgError>;
