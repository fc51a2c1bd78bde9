// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::core::session::{SessionSnapshot, SessionStatus};
use crate::core::types::BatchResult;

/// Request body for starting a batch analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub repos: Vec<String>,
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: f64,
}

fn default_hourly_rate() -> f64 {
    80.0
}

/// 202 response: work has been accepted and runs in the background.
#[derive(Debug, Serialize)]
pub struct AnalysisAccepted {
    pub session_id: String,
    pub message: String,
}

/// Poll response; `result` is present only once the session completes.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub status: SessionStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BatchResult>,
}

impl From<SessionSnapshot> for ProgressResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            status: snapshot.status,
            progress: snapshot.progress,
            message: snapshot.message,
            result: snapshot.result,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
