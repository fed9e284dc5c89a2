//! HTTP router for the search service

use crate::handlers;
use crate::orchestrator::SearchOrchestrator;
use crate::store::CandidateStore;
use axum::{
    routing::{get, post},
    Router,
};
use meetprep_common::config::AppConfig;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub store: Arc<dyn CandidateStore>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn CandidateStore>,
    ) -> meetprep_common::Result<Self> {
        let orchestrator = Arc::new(SearchOrchestrator::from_config(store.clone(), &config)?);
        Ok(Self {
            config,
            orchestrator,
            store,
        })
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // History search endpoints
        .route("/meetings/previous", post(handlers::meetings::search_previous))
        .route("/meetings/previous/simple", post(handlers::meetings::search_previous_simple))
        .route("/meetings/diagnose", post(handlers::meetings::diagnose));

    Router::new()
        .nest("/v1", api_routes)
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, MeetingRecord};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let now = Utc::now();
        let records = vec![
            MeetingRecord {
                storage_id: 1,
                title: "Ford EV Migration - 1".to_string(),
                occurred_at: now - Duration::days(20),
                content: "Kickoff notes".to_string(),
                location: Some("Dearborn".to_string()),
            },
            MeetingRecord {
                storage_id: 2,
                title: "Ford EV Migration - 2".to_string(),
                occurred_at: now - Duration::days(6),
                content: "Pilot review".to_string(),
                location: None,
            },
            MeetingRecord {
                storage_id: 3,
                title: "Generic Client Meeting".to_string(),
                occurred_at: now - Duration::days(2),
                content: "Misc".to_string(),
                location: None,
            },
        ];

        let store: Arc<dyn CandidateStore> = Arc::new(InMemoryStore::new(records));
        let state = AppState::new(Arc::new(AppConfig::default()), store).unwrap();
        create_router(state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let response = app()
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_store() {
        let response = app()
            .oneshot(Request::get("/v1/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["store"]["backend"], "memory");
        assert_eq!(body["checks"]["store"]["records"], 3);
    }

    #[tokio::test]
    async fn test_search_previous() {
        let response = app()
            .oneshot(post_json(
                "/v1/meetings/previous",
                json!({
                    "label": "Ford EV Migration - 3",
                    "exclude_timestamp": "2030-01-01T00:00:00Z"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_results"], 2);
        assert_eq!(body["results"][0]["metadata"]["summary"], "Ford EV Migration - 2");
        assert_eq!(body["results"][0]["content"], "Pilot review");
        assert_eq!(body["results"][1]["metadata"]["location"], "Dearborn");
    }

    #[tokio::test]
    async fn test_search_previous_simple() {
        let response = app()
            .oneshot(post_json("/v1/meetings/previous/simple", json!({"label": "Ford budget"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_results"], 2);
        assert_eq!(body["results"][0]["relevance_score"], 0.0);
    }

    #[tokio::test]
    async fn test_diagnose() {
        let response = app()
            .oneshot(post_json("/v1/meetings/diagnose", json!({"label": "Ford EV Migration - 3"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_records"], 3);
        assert_eq!(body["strategy_count"], 4);
        assert_eq!(body["potential_matches"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_empty_label_is_rejected() {
        let response = app()
            .oneshot(post_json("/v1/meetings/previous", json!({"label": ""})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "label");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let response = app()
            .oneshot(post_json("/v1/meetings/previous", json!({"title": "Ford"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::get("/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }
}
