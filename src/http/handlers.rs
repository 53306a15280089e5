use super::state::AppState;
use crate::analysis::{self, local_summary};
use crate::export;
use crate::transcript::TranscriptLog;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    pub tab_id: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopRecordingRequest {
    #[serde(default)]
    pub auto_triggered: bool,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default = "default_template_id")]
    pub template_id: String,
    /// Also write the result to the export directory
    #[serde(default)]
    pub export: bool,
}

fn default_template_id() -> String {
    analysis::DEFAULT_TEMPLATE_ID.to_string()
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub text: String,
    /// True when the local non-AI summary was used (no API key configured)
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recording/start
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    respond_to_lifecycle(state.coordinator.start_recording(req.tab_id).await)
}

/// POST /recording/auto-start
/// Same transition as a manual start, initiated by presence detection
pub async fn auto_start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    respond_to_lifecycle(state.coordinator.start_recording(req.tab_id).await)
}

/// POST /recording/stop
pub async fn stop_recording(
    State(state): State<AppState>,
    Json(req): Json<StopRecordingRequest>,
) -> impl IntoResponse {
    respond_to_lifecycle(state.coordinator.stop_recording(req.auto_triggered).await)
}

/// Map a coordinator reply onto the `{success, error?}` contract.
/// State-conflict rejections are client errors, not server faults.
fn respond_to_lifecycle(result: anyhow::Result<()>) -> axum::response::Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())).into_response(),
        Err(e) => {
            let message = format!("{:#}", e);
            let status = if message.contains("already in progress")
                || message.contains("Not currently recording")
            {
                StatusCode::CONFLICT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(AckResponse::failed(message))).into_response()
        }
    }
}

/// GET /recording/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.status().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            error!("Status query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /transcript, returning the accumulated transcript in its persisted
/// line form
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.transcript().await {
        Ok(transcript) => (StatusCode::OK, transcript).into_response(),
        Err(e) => {
            error!("Transcript query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// DELETE /transcript
pub async fn clear_transcript(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.clear_transcript().await {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AckResponse::failed(e.to_string())),
        )
            .into_response(),
    }
}

/// GET /analysis/templates
pub async fn list_templates() -> impl IntoResponse {
    (StatusCode::OK, Json(analysis::TEMPLATES)).into_response()
}

/// POST /analysis
///
/// With an API key configured, asks the LLM provider; without one, falls
/// back to the local transcript statistics summary (which never fails).
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let transcript = match state.coordinator.transcript().await {
        Ok(t) => t,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };

    let template = analysis::template_by_id(&req.template_id);

    let (text, fallback) = if state.settings.api_key.trim().is_empty() {
        info!("No API key configured, producing local summary");
        let log = TranscriptLog::parse(&transcript);
        (local_summary(&log), true)
    } else {
        match state
            .requestor
            .analyze(&transcript, &state.settings, &req.template_id)
            .await
        {
            Ok(text) => (text, false),
            Err(e) => {
                error!("Analysis failed: {:#}", e);
                let status = if format!("{}", e).contains("empty") {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::BAD_GATEWAY
                };
                return (
                    status,
                    Json(ErrorResponse {
                        error: format!("{:#}", e),
                    }),
                )
                    .into_response();
            }
        }
    };

    if req.export {
        if let Err(e) = export::write_analysis(&state.export_dir, &text, template.name).await {
            error!("Analysis export failed: {}", e);
        }
    }

    (StatusCode::OK, Json(AnalyzeResponse { text, fallback })).into_response()
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
