//! `config.toml` storage.
//!
//! Loads the application configuration and writes it back atomically
//! (tmp file + rename) for `multiorg config init`.

use multiorg_core::MultiorgError;
use multiorg_core::config::AppConfig;
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigStorageError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

impl From<toml::ser::Error> for ConfigStorageError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigStorageError::TomlSerError(e)
    }
}

impl From<ConfigStorageError> for MultiorgError {
    fn from(e: ConfigStorageError) -> Self {
        match e {
            ConfigStorageError::IoError(err) => err.into(),
            ConfigStorageError::TomlParseError(err) => err.into(),
            ConfigStorageError::TomlSerError(err) => err.into(),
        }
    }
}

/// Storage for the application config file.
///
/// Responsibilities:
/// - Load config.toml into `AppConfig`
/// - Write config.toml atomically
///
/// Does NOT:
/// - Apply environment overrides (see `ConfigService`)
/// - Read credentials (see `SecretStorage`)
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the config file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(AppConfig))`: Successfully loaded
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<AppConfig>, ConfigStorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Saves the config atomically.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigStorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(config)?;

        // Write to temporary file in the same directory
        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}
