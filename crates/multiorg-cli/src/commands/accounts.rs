use crate::context::AppContext;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use multiorg_application::FanOutQueryRunner;
use multiorg_core::org::{ConnectionOutcome, ConnectionSet};
use std::fmt::Write as _;

#[derive(Args, Debug)]
pub struct AccountsArgs {
    /// Connection to query; repeat for several. Defaults to the configured list
    #[arg(short, long = "connection", value_name = "NAME")]
    pub connections: Vec<String>,

    /// SOQL to run instead of the configured query
    #[arg(long)]
    pub soql: Option<String>,

    /// Print the per-connection results as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: AccountsArgs, context: &AppContext) -> Result<()> {
    let config = context.load_config()?;
    let connections = if args.connections.is_empty() {
        config.connection_set()
    } else {
        ConnectionSet::from_names(args.connections.iter().map(String::as_str))
    };
    let soql = args.soql.unwrap_or(config.query.soql);

    let runner = FanOutQueryRunner::new(context.authorizer()?, connections);
    let outcomes = runner.run_query(&soql).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        print!("{}", render_table(&outcomes));
    }

    Ok(())
}

fn render_table(outcomes: &[ConnectionOutcome]) -> String {
    let mut out = String::new();
    if outcomes.is_empty() {
        let _ = writeln!(
            out,
            "No connections configured. Add `connections` to config.toml or set MULTIORG_CONNECTIONS."
        );
        return out;
    }

    for outcome in outcomes {
        let name = outcome.connection_name().as_str().bold();
        match outcome.error() {
            Some(error) => {
                let _ = writeln!(out, "{}  {}", name, format!("error: {error}").red());
            }
            None => {
                let accounts = outcome.accounts();
                let _ = writeln!(out, "{}  ({} account(s))", name, accounts.len());
                let width = accounts
                    .iter()
                    .map(|a| a.name.chars().count())
                    .max()
                    .unwrap_or(0)
                    .max("NAME".len());
                if !accounts.is_empty() {
                    let header = format!("{:<width$}  ID", "NAME");
                    let _ = writeln!(out, "  {}", header.dimmed());
                }
                for account in accounts {
                    let _ = writeln!(out, "  {:<width$}  {}", account.name, account.id);
                }
            }
        }
        out.push('\n');
    }
    out
}
