use crate::GlobalArgs;
use anyhow::Result;
use multiorg_core::config::AppConfig;
use multiorg_infrastructure::{ConfigService, CredentialAuthorizer, MultiorgPaths};
use std::sync::Arc;

/// Resolved file locations shared by every command.
pub struct AppContext {
    service: ConfigService,
}

impl AppContext {
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let paths = MultiorgPaths::new(args.config_dir.as_deref());
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => paths.config_file()?,
        };
        let secret_path = match &args.secrets {
            Some(path) => path.clone(),
            None => paths.secret_file()?,
        };

        tracing::debug!("Using config {:?} and secrets {:?}", config_path, secret_path);
        Ok(Self {
            service: ConfigService::new(config_path, secret_path),
        })
    }

    pub fn service(&self) -> &ConfigService {
        &self.service
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        Ok(self.service.load_config()?)
    }

    pub fn authorizer(&self) -> Result<Arc<CredentialAuthorizer>> {
        let secrets = self.service.load_secrets()?;
        Ok(Arc::new(CredentialAuthorizer::new(secrets)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_files_override_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        let args = GlobalArgs {
            config_dir: Some(temp_dir.path().to_path_buf()),
            secrets: Some(PathBuf::from("/etc/multiorg/orgs.json")),
            ..GlobalArgs::default()
        };

        let context = AppContext::from_args(&args).unwrap();

        assert_eq!(
            context.service().config_path(),
            temp_dir.path().join("config.toml")
        );
        assert_eq!(
            context.service().secret_path(),
            PathBuf::from("/etc/multiorg/orgs.json")
        );
    }
}
