use crate::context::AppContext;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use multiorg_application::{
    BulkDemoSettings, BulkDemoStart, BulkDemoUseCase, BulkJobMonitor, MonitorPolicy,
    MonitorSupervisor,
};
use multiorg_core::bulk::{MonitorOutcome, TabularData};
use multiorg_core::org::ConnectionName;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct BulkDemoArgs {
    /// Connection to insert into
    #[arg(short, long, value_name = "NAME")]
    pub connection: String,

    /// CSV file with a header row; columns are sObject field names
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,

    /// Target sObject (defaults to `bulk.object` from config.toml)
    #[arg(long)]
    pub object: Option<String>,

    /// Exit after submission instead of waiting for the job to finish
    #[arg(long)]
    pub detach: bool,
}

pub async fn execute(args: BulkDemoArgs, context: &AppContext) -> Result<()> {
    let config = context.load_config()?;
    let data = read_csv(&args.csv)?;

    let mut settings = BulkDemoSettings::from(&config.bulk);
    if let Some(object) = args.object {
        settings.object = object;
    }

    let monitor = Arc::new(BulkJobMonitor::new(MonitorPolicy::from(&config.monitor)));
    let supervisor = Arc::new(MonitorSupervisor::new(monitor));
    let use_case = BulkDemoUseCase::new(context.authorizer()?, supervisor.clone(), settings);

    let connection = ConnectionName::new(&args.connection);
    match use_case.start(&connection, data).await? {
        BulkDemoStart::Skipped { existing } => {
            println!(
                "{} already has {} matching record(s); nothing submitted",
                connection.as_str().bold(),
                existing
            );
        }
        BulkDemoStart::Submitted { job_id, monitor } => {
            println!(
                "Submitted bulk job {} at {}",
                job_id.bold(),
                monitor.started_at().format("%H:%M:%S")
            );
            if args.detach {
                return Ok(());
            }

            tokio::select! {
                outcome = monitor.join() => report(&job_id, &outcome?)?,
                _ = tokio::signal::ctrl_c() => {
                    eprintln!("Interrupted, stopping monitor...");
                    supervisor.shutdown().await;
                    println!("Stopped monitoring bulk job {}", job_id);
                }
            }
        }
    }

    Ok(())
}

/// Reads a CSV file into rows for an ingest job.
fn read_csv(path: &Path) -> Result<TabularData> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let columns = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Invalid CSV in {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(TabularData::new(columns, rows)?)
}

fn report(job_id: &str, outcome: &MonitorOutcome) -> Result<()> {
    match outcome {
        MonitorOutcome::Completed { processed } => {
            println!("✅ Bulk job {} complete: {} record(s) processed", job_id, processed);
        }
        MonitorOutcome::PartiallyFailed {
            processed,
            failed,
            records,
        } => {
            println!(
                "{} Bulk job {} complete: {} of {} record(s) failed",
                "⚠".yellow(),
                job_id,
                failed,
                processed
            );
            for record in records {
                println!(
                    "  {}  {}",
                    record.sf_id.as_deref().unwrap_or("-"),
                    record.sf_error.red()
                );
            }
        }
        MonitorOutcome::Terminated {
            state,
            error_message,
            ..
        } => {
            anyhow::bail!(
                "Bulk job {} ended in state {}: {}",
                job_id,
                state,
                error_message.as_deref().unwrap_or("no error message")
            );
        }
        MonitorOutcome::PollError { message } => {
            anyhow::bail!("Stopped monitoring bulk job {}: {}", job_id, message);
        }
        MonitorOutcome::TimedOut { polls } => {
            anyhow::bail!(
                "Bulk job {} still running after {} poll(s); check it in Setup > Bulk Data Load Jobs",
                job_id,
                polls
            );
        }
        MonitorOutcome::Cancelled { .. } => {
            println!("Stopped monitoring bulk job {}", job_id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiorg_core::bulk::BulkJobState;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("accounts.csv");
        fs::write(
            &path,
            "Name,Phone\nBulk Demo 1,555-0100\n\"Bulk Demo 2, Inc.\",555-0101\n",
        )
        .unwrap();

        let data = read_csv(&path).unwrap();
        assert_eq!(data.columns(), ["Name", "Phone"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows()[1][0], "Bulk Demo 2, Inc.");
    }

    #[test]
    fn test_read_csv_rejects_ragged_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ragged.csv");
        fs::write(&path, "Name,Phone\nBulk Demo 1\n").unwrap();

        assert!(read_csv(&path).is_err());
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = read_csv(Path::new("/nonexistent/accounts.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/accounts.csv"));
    }

    #[test]
    fn test_report_fails_for_unfinished_jobs() {
        assert!(report("750xx", &MonitorOutcome::Completed { processed: 3 }).is_ok());
        assert!(report("750xx", &MonitorOutcome::Cancelled { polls: 2 }).is_ok());
        assert!(report("750xx", &MonitorOutcome::TimedOut { polls: 2 }).is_err());

        let terminated = MonitorOutcome::Terminated {
            state: BulkJobState::Failed,
            processed: 0,
            failed: 0,
            error_message: Some("InvalidBatch".to_string()),
        };
        let err = report("750xx", &terminated).unwrap_err();
        assert_eq!(err.to_string(), "Bulk job 750xx ended in state Failed: InvalidBatch");
    }
}
