//! Unified path management for multiorg configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/multiorg/          # Config directory (platform config dir)
//! ├── config.toml              # Connection list, query, monitor and bulk settings
//! └── secret.json              # Per-connection instance URLs and access tokens
//! ```

use multiorg_core::config::{OrgCredentials, SecretConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "multiorg";
const CONFIG_FILE: &str = "config.toml";
const SECRET_FILE: &str = "secret.json";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves the multiorg config directory and the files in it.
///
/// A base path overrides the platform directory (used by tests and `--config-dir`).
#[derive(Debug, Clone)]
pub struct MultiorgPaths {
    base: Option<PathBuf>,
}

impl MultiorgPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the config directory (e.g. `~/.config/multiorg/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(SECRET_FILE))
    }
}

/// Writes a secret.json template to `path` unless a file already exists.
///
/// Returns whether the file was created. On Unix the new file gets mode 600.
pub fn ensure_secret_template(path: &Path) -> Result<bool, std::io::Error> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut orgs = BTreeMap::new();
    orgs.insert(
        "my-org".to_string(),
        OrgCredentials {
            instance_url: "https://example.my.salesforce.com".to_string(),
            access_token: String::new(),
            api_version: None,
        },
    );
    let template_json =
        serde_json::to_string_pretty(&SecretConfig { orgs }).map_err(std::io::Error::other)?;

    std::fs::write(path, template_json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
    }

    Ok(true)
}
