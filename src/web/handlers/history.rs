// GET /api/history: the caller's stored analyses, newest first.
//
// Optional ?limit= parameter (default 20, max 100). Tier, alert flag and
// display state are recomputed from the stored score and labels.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::error;

use crate::db::models::StoredAnalysis;
use crate::web::{api_error, AppState, AuthUser};

#[derive(Deserialize, Default)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn list_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HistoryQuery>,
) -> Response {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let analyses = match state.db.get_user_analyses(user.user_id, limit).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "Failed to load analysis history");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not load history");
        }
    };

    let analyses: Vec<serde_json::Value> = analyses.iter().map(history_entry).collect();
    Json(serde_json::json!({ "analyses": analyses })).into_response()
}

fn history_entry(analysis: &StoredAnalysis) -> serde_json::Value {
    let result = analysis.result();
    let decision = result.decision();
    serde_json::json!({
        "id": analysis.id,
        "created_at": analysis.created_at,
        "toxicity_score": analysis.toxicity_score,
        "severity_level": decision.tier,
        "ui_state": decision.ui_state,
        "guardian_alert_required": decision.guardian_alert_required,
        "guardian_alerted": analysis.guardian_alerted,
        "detected_labels": analysis.labels.to_json(),
        "display_labels": analysis.labels.display_labels(analysis.toxicity_score),
        "explanation": analysis.explanation,
        "support_message": analysis.support_message,
        "safe_response_steps": analysis.safe_response_steps,
        "content_preview": analysis.content_preview,
        "source": analysis.source,
    })
}
