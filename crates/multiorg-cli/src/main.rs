use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod context;

use commands::accounts::AccountsArgs;
use commands::bulk_demo::BulkDemoArgs;
use commands::config::ConfigAction;
use context::AppContext;

#[derive(Parser)]
#[command(name = "multiorg")]
#[command(about = "Query many Salesforce orgs at once and monitor bulk ingest jobs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding config.toml and secret.json
    #[arg(long, global = true, env = "MULTIORG_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Path to config.toml (overrides --config-dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to secret.json (overrides --config-dir)
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List accounts from every configured connection
    Accounts(AccountsArgs),
    /// Insert demo rows into one connection and monitor the bulk job
    BulkDemo(BulkDemoArgs),
    /// Inspect or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let context = AppContext::from_args(&cli.global)?;

    match cli.command {
        Commands::Accounts(args) => commands::accounts::execute(args, &context).await?,
        Commands::BulkDemo(args) => commands::bulk_demo::execute(args, &context).await?,
        Commands::Config { action } => commands::config::execute(action, &context)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "multiorg",
            "accounts",
            "--config",
            "/tmp/multiorg.toml",
            "-v",
            "--connection",
            "org-a",
        ]);

        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/multiorg.toml")));
        assert!(cli.global.verbose);
        match cli.command {
            Commands::Accounts(args) => assert_eq!(args.connections, ["org-a"]),
            _ => panic!("Expected accounts command"),
        }
    }

    #[test]
    fn test_bulk_demo_requires_connection_and_csv() {
        assert!(Cli::try_parse_from(["multiorg", "bulk-demo", "--csv", "rows.csv"]).is_err());

        let cli = Cli::parse_from([
            "multiorg",
            "bulk-demo",
            "--connection",
            "org-a",
            "--csv",
            "rows.csv",
            "--detach",
        ]);
        match cli.command {
            Commands::BulkDemo(args) => {
                assert_eq!(args.connection, "org-a");
                assert_eq!(args.csv, PathBuf::from("rows.csv"));
                assert!(args.detach);
                assert_eq!(args.object, None);
            }
            _ => panic!("Expected bulk-demo command"),
        }
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["multiorg", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
