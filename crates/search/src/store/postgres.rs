//! Postgres-backed candidate store
//!
//! Reads the `documents` table through the shared [`Repository`]. Each
//! query runs under the configured per-pattern timeout.

use super::{parse_timestamp, CandidateStore, MeetingRecord, PatternQuery};
use chrono::Utc;
use meetprep_common::db::models::Document;
use meetprep_common::errors::{AppError, Result};
use meetprep_common::metrics::record_skipped_record;
use meetprep_common::Repository;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const BACKEND: &str = "postgres";

/// Candidate store over the `documents` table
pub struct PgCandidateStore {
    repo: Repository,
    timeout: Duration,
}

impl PgCandidateStore {
    pub fn new(repo: Repository, timeout: Duration) -> Self {
        Self { repo, timeout }
    }
}

/// Run `fut` under `timeout`, mapping failures onto the store error
/// variants for `pattern`
pub(crate) async fn bounded<T, F>(pattern: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AppError::StoreQuery {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Err(AppError::StoreTimeout {
            pattern: pattern.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

#[async_trait::async_trait]
impl CandidateStore for PgCandidateStore {
    async fn find(&self, query: &PatternQuery) -> Result<Vec<MeetingRecord>> {
        let documents = bounded(
            &query.pattern,
            self.timeout,
            self.repo.find_documents_by_summary(
                &query.pattern,
                &query.exclude_timestamp,
                query.limit as u64,
                query.newest_first,
            ),
        )
        .await?;

        Ok(normalize_documents(documents, BACKEND))
    }

    async fn scan(&self, exclude_timestamp: &str) -> Result<Vec<MeetingRecord>> {
        let documents = bounded(
            "*",
            self.timeout,
            self.repo.list_documents_excluding(exclude_timestamp),
        )
        .await?;

        Ok(normalize_documents(documents, BACKEND))
    }

    async fn count(&self) -> Result<u64> {
        self.repo.count_documents().await
    }

    async fn ping(&self) -> Result<()> {
        self.repo.ping().await
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}

/// Normalize one stored document.
///
/// The start time comes from `metadata.startTime`, falling back to the
/// `start_time` column. A document without a readable title or start time
/// is a parse error.
pub fn record_from_document(document: Document) -> Result<MeetingRecord> {
    let metadata = document.parse_metadata()?;

    let occurred_at = metadata
        .start_time
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| document.start_time.map(|ts| ts.with_timezone(&Utc)))
        .ok_or_else(|| AppError::Parse {
            message: format!(
                "document {}: unreadable start time {:?}",
                document.id, metadata.start_time
            ),
        })?;

    Ok(MeetingRecord {
        storage_id: document.id,
        title: metadata.summary,
        occurred_at,
        content: document.content.unwrap_or_default(),
        location: metadata.location.or(document.location),
    })
}

/// Normalize a batch, skipping (and counting) malformed rows
pub(crate) fn normalize_documents(documents: Vec<Document>, store: &str) -> Vec<MeetingRecord> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.id;
            match record_from_document(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(store, document_id = id, error = %e, "Skipping malformed record");
                    record_skipped_record(store);
                    None
                }
            }
        })
        .collect()
}
