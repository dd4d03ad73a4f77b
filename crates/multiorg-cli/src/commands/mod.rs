pub mod accounts;
pub mod bulk_demo;
pub mod config;
