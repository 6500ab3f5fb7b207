// Auth handlers: signup, login, logout and the current-user lookup.
//
// Signup and login both end by setting a freshly signed session cookie, so
// every login starts a new dashboard session with an empty recent list.
// Logout clears the cookie and forgets that session's in-memory state.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::{error, info};

use crate::db::models::User;
use crate::web::auth::{
    clear_cookie_header, create_token, hash_password, set_cookie_header, verify_password,
};
use crate::web::{api_error, AppState, AuthUser};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct SignupRequest {
    name: String,
    email: String,
    password: String,
    guardian_email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// POST /api/signup: create an account linked to a guardian email.
pub async fn signup(State(state): State<AppState>, Json(body): Json<SignupRequest>) -> Response {
    if let Err(message) = validate_signup(&body) {
        return api_error(StatusCode::BAD_REQUEST, message);
    }

    let password = body.password.clone();
    let rounds = state.config.password_rounds;
    let password_hash =
        match tokio::task::spawn_blocking(move || hash_password(&password, rounds)).await {
            Ok(hash) => hash,
            Err(e) => {
                error!(error = %e, "Password hashing task failed");
                return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not create account");
            }
        };
    let created = state
        .db
        .create_user(&body.name, &body.email, &password_hash, &body.guardian_email)
        .await;

    let user_id = match created {
        Ok(Some(id)) => id,
        Ok(None) => return api_error(StatusCode::CONFLICT, "Email already exists"),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not create account");
        }
    };
    info!(user_id, "Account created");

    match state.db.get_user_by_id(user_id).await {
        Ok(Some(user)) => session_response(&state, StatusCode::CREATED, &user),
        _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not create account"),
    }
}

/// POST /api/login: authenticate with email and password.
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    let user = match state.db.get_user_by_email(&body.email).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Failed to look up user");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    let Some(user) = user else {
        return api_error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    let password = body.password;
    let stored = user.password_hash.clone();
    match tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await {
        Ok(true) => session_response(&state, StatusCode::OK, &user),
        Ok(false) => api_error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        Err(e) => {
            error!(error = %e, "Password check task failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        }
    }
}

/// POST /api/logout: clear the session cookie and its dashboard state.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    state.sessions.remove(&user.session_id).await;
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_cookie_header())],
        Json(serde_json::json!({ "message": "Logged out" })),
    )
        .into_response()
}

/// GET /api/me: the signed-in user's profile.
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> Response {
    match state.db.get_user_by_id(user.user_id).await {
        Ok(Some(user)) => Json(user_json(&user)).into_response(),
        Ok(None) => api_error(StatusCode::UNAUTHORIZED, "Account no longer exists"),
        Err(e) => {
            error!(error = %e, "Failed to load user");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not load account")
        }
    }
}

fn session_response(state: &AppState, status: StatusCode, user: &User) -> Response {
    let token = create_token(&state.config.session_secret, user.id);
    // TLS terminates at the proxy, so the server can't tell; leave Secure off.
    let cookie = set_cookie_header(&token, false);
    (
        status,
        [(header::SET_COOKIE, cookie)],
        Json(user_json(user)),
    )
        .into_response()
}

fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "guardian_email": user.guardian_email,
        "created_at": user.created_at,
    })
}

fn validate_signup(body: &SignupRequest) -> Result<(), &'static str> {
    if body.name.trim().is_empty() {
        return Err("Name is required");
    }
    if !looks_like_email(&body.email) {
        return Err("A valid email is required");
    }
    if !looks_like_email(&body.guardian_email) {
        return Err("A valid guardian email is required");
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, guardian: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: "Sam".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            guardian_email: guardian.to_string(),
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("sam@example.com"));
        assert!(looks_like_email("  sam@example.com "));
        assert!(!looks_like_email("sam"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("sam@localhost"));
        assert!(!looks_like_email("s am@example.com"));
    }

    #[test]
    fn test_signup_validation() {
        assert!(validate_signup(&request("a@b.co", "g@b.co", "longenough")).is_ok());
        assert!(validate_signup(&request("a@b.co", "g@b.co", "short")).is_err());
        assert!(validate_signup(&request("a@b.co", "nope", "longenough")).is_err());

        let mut nameless = request("a@b.co", "g@b.co", "longenough");
        nameless.name = "   ".to_string();
        assert!(validate_signup(&nameless).is_err());
    }
}
