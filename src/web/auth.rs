// Auth middleware: stateless HMAC-SHA256 session cookies plus password hashing.
//
// Session token format: {user_id}.{timestamp_secs}.{nonce_hex}.{hmac_hex}
//
// The HMAC covers "{user_id}.{timestamp_secs}.{nonce_hex}" signed with SECRET_KEY.
// Tokens are valid for SESSION_TTL_SECS (24 hours). The nonce doubles as the
// session ID that keys the in-memory dashboard state.
//
// Auth check (this middleware):
//   extract carecloud_session cookie → parse → verify HMAC → verify age → allow
//
// Password hashes: "pbkdf2-sha256${rounds}${salt_hex}${hash_hex}".

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::{AppState, AuthUser};

type HmacSha256 = Hmac<Sha256>;

/// Session cookie name.
pub const COOKIE_NAME: &str = "carecloud_session";

/// Session lifetime: 24 hours.
pub const SESSION_TTL_SECS: u64 = 86_400;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Claims carried by a verified session token.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub session_id: String,
}

/// Build a new session token for `user_id` signed with `secret`.
///
/// Returns the raw cookie value (the token string, not the full Set-Cookie header).
pub fn create_token(secret: &str, user_id: i64) -> String {
    let timestamp = now_secs();

    let mut nonce_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = hex::encode(nonce_bytes);

    let payload = format!("{user_id}.{timestamp}.{nonce}");
    let sig = hmac_sign(secret, &payload);

    format!("{payload}.{sig}")
}

/// Verify a session token. Returns its claims if the HMAC is valid and the
/// token is not older than `SESSION_TTL_SECS`.
pub fn verify_token(secret: &str, token: &str) -> Option<SessionClaims> {
    let parts: Vec<&str> = token.splitn(4, '.').collect();
    let [user_id, timestamp_str, nonce, provided_sig] = parts[..] else {
        return None;
    };

    let payload = format!("{user_id}.{timestamp_str}.{nonce}");
    let expected_sig = hmac_sign(secret, &payload);
    if !constant_time_eq(provided_sig, &expected_sig) {
        return None;
    }

    let timestamp = timestamp_str.parse::<u64>().ok()?;
    if now_secs().saturating_sub(timestamp) >= SESSION_TTL_SECS {
        return None;
    }

    Some(SessionClaims {
        user_id: user_id.parse().ok()?,
        session_id: nonce.to_string(),
    })
}

/// Axum middleware: reject requests without a valid session cookie with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = session_cookie(request.headers())
        .and_then(|token| verify_token(&state.config.session_secret, token));

    let Some(claims) = claims else {
        return super::api_error(StatusCode::UNAUTHORIZED, "Authentication required");
    };

    request.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        session_id: claims.session_id,
    });
    next.run(request).await
}

/// Build the `Set-Cookie` header value for a new session.
pub fn set_cookie_header(token: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{COOKIE_NAME}={token}; HttpOnly{secure_flag}; SameSite=Strict; Path=/; Max-Age={SESSION_TTL_SECS}"
    )
}

/// Build the `Set-Cookie` header value that clears the session cookie.
pub fn clear_cookie_header() -> String {
    format!("{COOKIE_NAME}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0")
}

/// Hash a password with a random salt.
pub fn hash_password(password: &str, rounds: u32) -> String {
    let rounds = rounds.max(1);
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt, rounds);
    format!(
        "{HASH_SCHEME}${rounds}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, rounds, salt_hex, hash_hex] = parts[..] else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let (Ok(rounds), Ok(salt)) = (rounds.parse::<u32>(), hex::decode(salt_hex)) else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    let computed = hex::encode(derive(password, &salt, rounds));
    constant_time_eq(&computed, hash_hex)
}

// --- Private helpers ---

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn hmac_sign(secret: &str, payload: &str) -> String {
    // HMAC accepts keys of any length, so this never fails.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() || a.is_empty() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Raw session token from the Cookie header, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name.trim() == COOKIE_NAME).then(|| value.trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_roundtrip() {
        let secret = "test_secret_32_bytes_long_enough!";
        let token = create_token(secret, 42);
        let claims = verify_token(secret, &token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.session_id.len(), 32);
    }

    #[test]
    fn test_each_token_is_a_new_session() {
        let secret = "test_secret_32_bytes_long_enough!";
        let a = verify_token(secret, &create_token(secret, 1)).unwrap();
        let b = verify_token(secret, &create_token(secret, 1)).unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token("correct_secret", 1);
        assert!(verify_token("wrong_secret", &token).is_none());
    }

    #[test]
    fn test_swapped_user_id_rejected() {
        let secret = "my_secret";
        let token = create_token(secret, 1);
        let forged = token.replacen("1.", "2.", 1);
        assert!(verify_token(secret, &forged).is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = "my_secret";
        let old = now_secs() - SESSION_TTL_SECS - 1;
        let payload = format!("7.{old}.abcdef");
        let token = format!("{payload}.{}", hmac_sign(secret, &payload));
        assert!(verify_token(secret, &token).is_none());
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(verify_token("secret", "").is_none());
        assert!(verify_token("secret", "onlytwoparts.here").is_none());
        assert!(verify_token("secret", "a.b.c").is_none());
    }

    #[test]
    fn test_password_hash_verifies() {
        let stored = hash_password("correct horse", 1_000);
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_password_hash_is_salted() {
        assert_ne!(hash_password("pw", 10), hash_password("pw", 10));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "plaintext"));
        assert!(!verify_password("pw", "md5$1$00$00"));
        assert!(!verify_password("pw", "pbkdf2-sha256$0$00$00"));
    }

    #[test]
    fn test_session_cookie_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; carecloud_session=abc.def ; other=1"),
        );
        assert_eq!(session_cookie(&headers), Some("abc.def"));

        let empty = HeaderMap::new();
        assert_eq!(session_cookie(&empty), None);
    }
}
