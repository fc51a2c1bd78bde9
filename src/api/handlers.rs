// src/api/handlers.rs

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::{types::*, ApiState};
use crate::core::orchestrator::validate_request;

/// POST /api/v1/analyses — Validate and start a batch analysis.
/// Validation failures reject synchronously; no session is created.
pub async fn start_analysis(
    State(state): State<ApiState>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<(StatusCode, Json<AnalysisAccepted>), (StatusCode, Json<ErrorResponse>)> {
    let request = validate_request(&body.repos, body.hourly_rate).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let repo_count = request.targets.len();
    let session_id = state.orchestrator.start(request);
    tracing::info!(session = %session_id, repos = repo_count, "analysis started");

    Ok((
        StatusCode::ACCEPTED,
        Json(AnalysisAccepted {
            session_id,
            message: format!("Analysis of {repo_count} repositories started"),
        }),
    ))
}

/// GET /api/v1/analyses/:id — Current snapshot for a session.
/// Never blocks on the worker; unknown ids get a distinguishable 404.
pub async fn get_progress(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.orchestrator.store().get(&id) {
        Some(snapshot) => Ok(Json(snapshot.into())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session '{id}' not found"),
            }),
        )),
    }
}

/// POST /api/v1/analyses/:id/cancel — Request cancellation of a running
/// session. The worker stops at the next repository or issue boundary.
pub async fn cancel_analysis(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    if state.orchestrator.store().cancel(&id) {
        Ok(Json(serde_json::json!({
            "session_id": id,
            "message": "Cancel requested. Analysis will stop at the next unit of work."
        })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No running session '{id}'"),
            }),
        ))
    }
}

/// GET /api/v1/health — Simple health check.
pub async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.provider_id,
    }))
}
