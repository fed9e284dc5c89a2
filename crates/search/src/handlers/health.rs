//! Health check handlers

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub store: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: meetprep_common::VERSION.to_string(),
    })
}

/// Readiness probe - checks the candidate store
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = Instant::now();
    let backend = state.store.backend().to_string();

    let probe = match state.store.ping().await {
        Ok(()) => state.store.count().await,
        Err(e) => Err(e),
    };

    let store_check = match probe {
        Ok(records) => CheckResult {
            status: "up".to_string(),
            backend,
            records: Some(records),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            backend,
            records: None,
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let all_healthy = store_check.status == "up";
    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks { store: store_check },
        }),
    )
}
