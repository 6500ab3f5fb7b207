// GET /api/session: the caller's submission phase and recent results.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};

use crate::web::{AppState, AuthUser};

pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    Json(state.sessions.snapshot(&user.session_id).await)
}
