//! Repository pattern for database operations
//!
//! Read-only access to the `documents` table. Title matching runs against
//! `metadata->>'summary'` with `ILIKE`, so patterns use SQL wildcards.

use crate::errors::Result;
use crate::db::DbPool;
use crate::db::models::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

const SUMMARY_ILIKE: &str = "metadata->>'summary' ILIKE ?";
const START_TIME_DIFFERS: &str = "metadata->>'startTime' IS DISTINCT FROM ?";

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Document Operations
    // ========================================================================

    /// Documents whose summary matches `pattern` case-insensitively, other
    /// than the meeting starting at `exclude_start_time`
    pub async fn find_documents_by_summary(
        &self,
        pattern: &str,
        exclude_start_time: &str,
        limit: u64,
        newest_first: bool,
    ) -> Result<Vec<Document>> {
        let query = DocumentEntity::find()
            .filter(Expr::cust_with_values(SUMMARY_ILIKE, [pattern.to_string()]))
            .filter(Expr::cust_with_values(START_TIME_DIFFERS, [exclude_start_time.to_string()]));

        let query = if newest_first {
            query.order_by_desc(DocumentColumn::StartTime)
        } else {
            query.order_by_asc(DocumentColumn::StartTime)
        };

        query
            .order_by_asc(DocumentColumn::Id)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Every document except the meeting starting at `exclude_start_time`,
    /// newest first
    pub async fn list_documents_excluding(
        &self,
        exclude_start_time: &str,
    ) -> Result<Vec<Document>> {
        DocumentEntity::find()
            .filter(Expr::cust_with_values(START_TIME_DIFFERS, [exclude_start_time.to_string()]))
            .order_by_desc(DocumentColumn::StartTime)
            .order_by_asc(DocumentColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Total number of stored documents
    pub async fn count_documents(&self) -> Result<u64> {
        DocumentEntity::find()
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }
}
