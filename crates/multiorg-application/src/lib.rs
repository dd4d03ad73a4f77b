//! Use cases for querying and loading data across many Salesforce orgs.
//!
//! Everything here depends only on the capability traits in
//! `multiorg_core::org`, so the concrete Salesforce adapter is injected by
//! the host.

pub mod bulk_demo;
pub mod bulk_monitor;
pub mod fan_out;

#[cfg(test)]
mod testing;

pub use bulk_demo::{BulkDemoSettings, BulkDemoStart, BulkDemoUseCase};
pub use bulk_monitor::{BulkJobMonitor, MonitorHandle, MonitorPolicy, MonitorSupervisor};
pub use fan_out::FanOutQueryRunner;
