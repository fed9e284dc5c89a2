//! Previous-meeting search handlers

use crate::aggregate::RankedResult;
use crate::diagnostics::DiagnosticReport;
use crate::handlers::validated;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use meetprep_common::errors::Result;
use meetprep_common::metrics::RequestMetrics;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

/// Search request for an upcoming meeting
#[derive(Debug, Deserialize, Validate)]
pub struct MeetingSearchRequest {
    /// Title of the upcoming meeting
    #[validate(length(min = 1, max = 500))]
    pub label: String,

    /// Start time of the upcoming meeting, as stored
    #[serde(default)]
    pub exclude_timestamp: String,
}

/// Search response
#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingSearchResponse {
    pub label: String,
    pub total_results: usize,
    pub results: Vec<RankedResult>,
    pub processing_time_ms: u64,
}

/// Ranked previous-meeting search
pub async fn search_previous(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MeetingSearchRequest>, JsonRejection>,
) -> Result<Json<MeetingSearchResponse>> {
    let metrics = RequestMetrics::start("POST", "/v1/meetings/previous");
    let start = Instant::now();
    let request = match validated(payload) {
        Ok(request) => request,
        Err(e) => {
            metrics.finish(e.status_code().as_u16());
            return Err(e);
        }
    };

    let results = state
        .orchestrator
        .search_previous_meetings(&request.label, &request.exclude_timestamp)
        .await;

    metrics.finish(200);
    Ok(Json(MeetingSearchResponse {
        label: request.label,
        total_results: results.len(),
        results,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Legacy single-company search
pub async fn search_previous_simple(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MeetingSearchRequest>, JsonRejection>,
) -> Result<Json<MeetingSearchResponse>> {
    let metrics = RequestMetrics::start("POST", "/v1/meetings/previous/simple");
    let start = Instant::now();
    let request = match validated(payload) {
        Ok(request) => request,
        Err(e) => {
            metrics.finish(e.status_code().as_u16());
            return Err(e);
        }
    };

    let results = state
        .orchestrator
        .search_previous_meetings_simple(&request.label, &request.exclude_timestamp)
        .await;

    metrics.finish(200);
    Ok(Json(MeetingSearchResponse {
        label: request.label,
        total_results: results.len(),
        results,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Diagnostic scan of stored history
pub async fn diagnose(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MeetingSearchRequest>, JsonRejection>,
) -> Result<Json<DiagnosticReport>> {
    let metrics = RequestMetrics::start("POST", "/v1/meetings/diagnose");
    let request = match validated(payload) {
        Ok(request) => request,
        Err(e) => {
            metrics.finish(e.status_code().as_u16());
            return Err(e);
        }
    };

    let report = state
        .orchestrator
        .diagnose_meeting_search(&request.label, &request.exclude_timestamp)
        .await;

    metrics.finish(200);
    Ok(Json(report))
}
