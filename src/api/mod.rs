// src/api/mod.rs — HTTP API for starting and polling batch analyses

pub mod handlers;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::core::orchestrator::AnalysisOrchestrator;
use crate::infra::config::ServerConfig;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// Provider id reported by the health endpoint.
    pub provider_id: String,
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/analyses", post(handlers::start_analysis))
        .route("/api/v1/analyses/{id}", get(handlers::get_progress))
        .route("/api/v1/analyses/{id}/cancel", post(handlers::cancel_analysis))
        .route("/api/v1/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the API server (runs until the process is stopped).
pub async fn start_server(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);

    let router = build_router(state);

    tracing::info!("issuecost API listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::core::session::SessionStore;
    use crate::core::types::{Issue, RepoTarget};
    use crate::estimator::ComplexityEstimator;
    use crate::github::IssueFetcher;
    use crate::infra::errors::IssueCostError;
    use crate::provider::{CompletionRequest, ModelProvider};

    struct NoopFetcher;

    #[async_trait::async_trait]
    impl IssueFetcher for NoopFetcher {
        async fn fetch_issues(&self, _: &RepoTarget) -> Result<Vec<Issue>, IssueCostError> {
            Ok(vec![])
        }
    }

    struct NoopProvider;

    #[async_trait::async_trait]
    impl ModelProvider for NoopProvider {
        fn id(&self) -> &str {
            "noop"
        }
        fn name(&self) -> &str {
            "Noop"
        }
        async fn complete(&self, _: CompletionRequest) -> Result<String, IssueCostError> {
            Ok("{}".into())
        }
    }

    fn test_state() -> ApiState {
        let store = Arc::new(SessionStore::new(60));
        let estimator = Arc::new(ComplexityEstimator::new(Arc::new(NoopProvider), 8.0));
        ApiState {
            orchestrator: Arc::new(AnalysisOrchestrator::new(
                store,
                Arc::new(NoopFetcher),
                estimator,
            )),
            provider_id: "noop".into(),
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_poll_unknown_session_is_404() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/analyses/not-a-session")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_request() {
        let app = build_router(test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/analyses")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"repos": [], "hourly_rate": 80}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_start_accepts_valid_request() {
        let app = build_router(test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/analyses")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"repos": ["https://github.com/acme/widgets"], "hourly_rate": 80}"#,
            ))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }
}
