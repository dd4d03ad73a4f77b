//! Configuration service.
//!
//! Resolves the application config and credentials once at startup.
//! Priority for the connection list: `MULTIORG_CONNECTIONS` > config.toml.

use crate::paths::MultiorgPaths;
use crate::storage::{ConfigStorage, SecretStorage, SecretStorageError};
use multiorg_core::config::{AppConfig, SecretConfig};
use multiorg_core::org::ConnectionSet;
use multiorg_core::{MultiorgError, Result};
use std::path::{Path, PathBuf};

/// Environment variable holding a comma-separated connection list.
pub const CONNECTIONS_ENV: &str = "MULTIORG_CONNECTIONS";

pub struct ConfigService {
    config_storage: ConfigStorage,
    secret_storage: SecretStorage,
}

impl ConfigService {
    pub fn new(config_path: PathBuf, secret_path: PathBuf) -> Self {
        Self {
            config_storage: ConfigStorage::new(config_path),
            secret_storage: SecretStorage::with_path(secret_path),
        }
    }

    /// Uses the config.toml and secret.json locations of `paths`.
    pub fn from_paths(paths: &MultiorgPaths) -> Result<Self> {
        let config_path = paths
            .config_file()
            .map_err(|e| MultiorgError::config(e.to_string()))?;
        let secret_path = paths
            .secret_file()
            .map_err(|e| MultiorgError::config(e.to_string()))?;
        Ok(Self::new(config_path, secret_path))
    }

    /// Loads config.toml and applies the `MULTIORG_CONNECTIONS` override.
    pub fn load_config(&self) -> Result<AppConfig> {
        let override_list = std::env::var(CONNECTIONS_ENV).ok();
        self.load_config_with(override_list.as_deref())
    }

    /// Loads config.toml, replacing the connection list with `connections_override`
    /// when given. A missing file yields the defaults.
    pub fn load_config_with(&self, connections_override: Option<&str>) -> Result<AppConfig> {
        let mut config = match self.config_storage.load()? {
            Some(config) => config,
            None => {
                tracing::debug!(
                    "No config file at {:?}, using defaults",
                    self.config_storage.path()
                );
                AppConfig::default()
            }
        };

        // A set-but-blank override counts as unset.
        if let Some(list) = connections_override.filter(|list| !list.trim().is_empty()) {
            let names: Vec<String> = ConnectionSet::parse_list(list)
                .iter()
                .map(|name| name.as_str().to_string())
                .collect();
            tracing::debug!(
                "Connection list overridden by {}: {:?}",
                CONNECTIONS_ENV,
                names
            );
            config.connections = names;
        }

        if config.monitor.poll_interval_secs == 0 {
            return Err(MultiorgError::config(
                "monitor.poll_interval_secs must be greater than zero",
            ));
        }

        Ok(config)
    }

    /// Loads secret.json. A missing file yields no credentials, so every
    /// connection is then reported as unknown by the authorizer.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        match self.secret_storage.load() {
            Ok(secrets) => Ok(secrets),
            Err(SecretStorageError::NotFound(path)) => {
                tracing::warn!("No secret file at {:?}; no org credentials loaded", path);
                Ok(SecretConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn config_path(&self) -> &Path {
        self.config_storage.path()
    }

    pub fn secret_path(&self) -> &Path {
        self.secret_storage.path()
    }

    pub fn config_storage(&self) -> &ConfigStorage {
        &self.config_storage
    }
}
