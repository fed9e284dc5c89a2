//! MeetPrep Common Library
//!
//! Shared code for the MeetPrep services including:
//! - Configuration management (including the curated lexicon)
//! - Error types and handling
//! - Read-only access to stored meeting documents
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, Repository};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
