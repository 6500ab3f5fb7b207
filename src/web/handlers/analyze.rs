// POST /api/analyze: run one submission through the moderation pipeline.
//
// Multipart form with an optional `text` field and an optional `image` file.
// Flow: parse → claim the session (409 if already analyzing) → assess →
// persist → guardian alert → record in the session's recent list.
//
// Collaborator failures return the session to Idle and surface a generic
// notice; the detail only goes to the log. A request dropped before it settles
// is reset to Idle by the session guard.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::alerts::deliver_alert;
use crate::analysis::traits::ImageInput;
use crate::db::models::NewAnalysis;
use crate::moderation::history::RecentEntry;
use crate::moderation::result::DecisionPayload;
use crate::output::preview_chars;
use crate::pipeline::submission::{assess, Submission};
use crate::web::{api_error, AppState, AuthUser};

/// Characters of analyzed text kept with each stored analysis.
const PREVIEW_CHARS: usize = 100;

pub async fn analyze(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Response {
    let submission = match read_submission(multipart).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    let account = match state.db.get_user_by_id(user.user_id).await {
        Ok(Some(account)) => account,
        Ok(None) => return api_error(StatusCode::UNAUTHORIZED, "Account no longer exists"),
        Err(e) => {
            error!(error = %e, "Failed to load user");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not load account");
        }
    };

    if state.sessions.begin(&user.session_id).await.is_err() {
        return api_error(StatusCode::CONFLICT, "An analysis is already in progress");
    }
    let guard = state.sessions.guard(&user.session_id);

    let assessment =
        match assess(state.analyzer.as_ref(), state.ocr.as_ref(), &submission).await {
            Ok(a) => a,
            Err(e) => {
                state.sessions.fail(&user.session_id).await;
                guard.disarm();
                error!(error = %format!("{e:#}"), user_id = user.user_id, "Analysis failed");
                return api_error(
                    StatusCode::BAD_GATEWAY,
                    "Analysis failed. Please try again.",
                );
            }
        };

    let preview = preview_chars(&assessment.analyzed_text, PREVIEW_CHARS);
    let stored = state
        .db
        .insert_analysis(&NewAnalysis {
            user_id: user.user_id,
            result: &assessment.result,
            content_preview: &preview,
            source: assessment.source.as_str(),
        })
        .await;
    let analysis_id = match stored {
        Ok(id) => id,
        Err(e) => {
            state.sessions.fail(&user.session_id).await;
            guard.disarm();
            error!(error = %e, "Failed to store analysis");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not save the analysis");
        }
    };

    if deliver_alert(
        state.notifier.as_ref(),
        &account.guardian_email,
        &assessment.result,
    )
    .await
    {
        if let Err(e) = state.db.mark_guardian_alerted(analysis_id).await {
            warn!(error = %e, analysis_id, "Failed to record guardian alert");
        }
    }

    let payload = DecisionPayload::new(&assessment.result, Some(analysis_id));
    let analyzed_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    state
        .sessions
        .complete(
            &user.session_id,
            RecentEntry::from_payload(&payload, analyzed_at),
            payload.ui_state,
        )
        .await;
    guard.disarm();

    info!(
        analysis_id,
        user_id = user.user_id,
        tier = %payload.severity_level,
        "Analysis complete"
    );
    (StatusCode::OK, Json(payload)).into_response()
}

/// Pull the `text` and `image` fields out of the multipart body.
///
/// An empty file input counts as no image.
async fn read_submission(mut multipart: Multipart) -> Result<Submission, Response> {
    let mut submission = Submission::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(api_error(e.status(), "Malformed upload")),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                submission.text = field
                    .text()
                    .await
                    .map_err(|e| api_error(e.status(), "Text must be valid UTF-8"))?;
            }
            "image" => {
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(e.status(), "Could not read the uploaded image"))?;
                if bytes.is_empty() {
                    continue;
                }
                if !mime_type.starts_with("image/") {
                    return Err(api_error(
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        "Only image uploads are supported",
                    ));
                }
                submission.image = Some(ImageInput::new(mime_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(submission)
}
