use crate::context::AppContext;
use anyhow::Result;
use clap::Subcommand;
use multiorg_core::config::AppConfig;
use multiorg_infrastructure::ensure_secret_template;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config and secret file locations
    Path,
    /// Write a default config.toml and a secret.json template
    Init {
        /// Overwrite an existing config.toml
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(action: ConfigAction, context: &AppContext) -> Result<()> {
    let service = context.service();
    match action {
        ConfigAction::Show => {
            let config = context.load_config()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("config:  {}", service.config_path().display());
            println!("secrets: {}", service.secret_path().display());
        }
        ConfigAction::Init { force } => {
            let config_path = service.config_path();
            if config_path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            service.config_storage().save(&AppConfig::default())?;
            println!("Wrote {}", config_path.display());

            let secret_path = service.secret_path();
            if ensure_secret_template(secret_path)? {
                println!(
                    "Wrote {} (fill in instance_url and access_token per connection)",
                    secret_path.display()
                );
            } else {
                println!("Kept existing {}", secret_path.display());
            }
        }
    }
    Ok(())
}
