//! Candidate stores
//!
//! The engine reads meeting history through [`CandidateStore`]. Two backends:
//! - Postgres (the `documents` table, via SeaORM)
//! - In-memory (seed file or fixtures, used for local runs and tests)
//!
//! Adapters normalize whatever shape the stored metadata has into
//! [`MeetingRecord`]; the engine never sees raw payloads.

mod memory;
mod postgres;

pub use memory::{like_match, InMemoryStore};
pub use postgres::{record_from_document, PgCandidateStore};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use meetprep_common::config::AppConfig;
use meetprep_common::db::DbPool;
use meetprep_common::errors::{AppError, Result};
use meetprep_common::Repository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A stored meeting, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    /// Storage key, used as the tie-break inside one pattern's results
    pub storage_id: i64,

    /// Meeting title as stored (`metadata.summary`)
    pub title: String,

    /// Meeting start
    pub occurred_at: DateTime<Utc>,

    /// Stored text body
    pub content: String,

    pub location: Option<String>,
}

/// A single pattern lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternQuery {
    /// `ILIKE`-style pattern matched against the title
    pub pattern: String,

    /// Records whose stored start time equals this are skipped
    pub exclude_timestamp: String,

    pub limit: usize,

    /// Order by start time descending (ascending otherwise)
    pub newest_first: bool,
}

/// Read access to stored meeting history
#[async_trait::async_trait]
pub trait CandidateStore: Send + Sync {
    /// Records whose title matches `query.pattern`, ordered by start time
    /// then storage id
    async fn find(&self, query: &PatternQuery) -> Result<Vec<MeetingRecord>>;

    /// Every record except the excluded meeting, newest first
    async fn scan(&self, exclude_timestamp: &str) -> Result<Vec<MeetingRecord>>;

    /// Number of stored records
    async fn count(&self) -> Result<u64>;

    /// Check the backing store is reachable
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Backend name for logs and metrics
    fn backend(&self) -> &'static str;
}

/// Build the store selected by `store.backend`
pub async fn create_store(config: &AppConfig) -> Result<Arc<dyn CandidateStore>> {
    match config.store.backend.as_str() {
        "postgres" => {
            let pool = DbPool::new(&config.database).await?;
            let store = PgCandidateStore::new(Repository::new(pool), config.store_query_timeout());
            info!(backend = "postgres", "Candidate store ready");
            Ok(Arc::new(store))
        }
        "memory" => {
            let store = match config.store.seed_file.as_deref() {
                Some(path) => InMemoryStore::from_seed_file(path)?,
                None => InMemoryStore::default(),
            };
            info!(backend = "memory", records = store.len(), "Candidate store ready");
            Ok(Arc::new(store))
        }
        other => Err(AppError::Configuration {
            message: format!("unknown store backend: {}", other),
        }),
    }
}

/// Parse a stored or caller-supplied start time.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` (taken as UTC) and
/// a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
