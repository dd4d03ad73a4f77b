pub mod bulk;
pub mod config;
pub mod error;
pub mod org;

// Re-export common error type
pub use error::{MultiorgError, Result};
