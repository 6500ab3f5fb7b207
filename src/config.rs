use std::env;

use anyhow::{Context, Result};

use crate::analysis::gemini::{DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL};

/// Which analysis backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerBackend {
    /// Google Gemini (default): requires AI_INTEGRATIONS_GEMINI_API_KEY, handles screenshots
    Gemini,
    /// Local child-safety rules only: no API key, text only
    Heuristic,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub db_path: String,
    pub analyzer_backend: AnalyzerBackend,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_url: String,
    /// Client-side request budget for Gemini (requests per minute, 0 = unpaced)
    pub gemini_rpm: u32,
    /// HTTP mail API endpoint for guardian alerts. Alerts are only logged when unset.
    pub mail_api_url: Option<String>,
    pub mail_api_key: String,
    pub mail_from: String,
    pub port: u16,
    pub bind: String,
    /// Secret for HMAC session token signing (SECRET_KEY env var)
    #[cfg(feature = "web")]
    pub session_secret: String,
    /// PBKDF2 iteration count for new password hashes
    #[cfg(feature = "web")]
    pub password_rounds: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./carecloud.db".to_string(),
            analyzer_backend: AnalyzerBackend::Gemini,
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_rpm: 15,
            mail_api_url: None,
            mail_api_key: String::new(),
            mail_from: "CareCloud <alerts@carecloud.local>".to_string(),
            port: 8080,
            bind: "0.0.0.0".to_string(),
            #[cfg(feature = "web")]
            session_secret: String::new(),
            #[cfg(feature = "web")]
            password_rounds: 100_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the secrets; use the `require_*`
    /// checks before operations that need them.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let analyzer_backend = match env::var("CARECLOUD_ANALYZER").as_deref() {
            Ok("heuristic") | Ok("local") => AnalyzerBackend::Heuristic,
            // "gemini" or unset both default to Gemini
            _ => AnalyzerBackend::Gemini,
        };

        let db_path = env::var("CARECLOUD_DB_PATH")
            .ok()
            .or_else(|| {
                env::var("DATABASE_URL")
                    .ok()
                    .and_then(|url| sqlite_path_from_url(&url))
            })
            .unwrap_or(defaults.db_path);

        let gemini_rpm = match env::var("GEMINI_RPM") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("GEMINI_RPM must be a whole number, got {v:?}"))?,
            Err(_) => defaults.gemini_rpm,
        };

        let port = match env::var("PORT") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {v:?}"))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            db_path,
            analyzer_backend,
            gemini_api_key: env::var("AI_INTEGRATIONS_GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_api_url: env::var("GEMINI_API_URL").unwrap_or(defaults.gemini_api_url),
            gemini_rpm,
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|u| !u.trim().is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            port,
            bind: env::var("BIND").unwrap_or(defaults.bind),
            #[cfg(feature = "web")]
            session_secret: env::var("SECRET_KEY").unwrap_or_default(),
            #[cfg(feature = "web")]
            password_rounds: match env::var("CARECLOUD_PASSWORD_ROUNDS") {
                Ok(v) => v.trim().parse().with_context(|| {
                    format!("CARECLOUD_PASSWORD_ROUNDS must be a whole number, got {v:?}")
                })?,
                Err(_) => defaults.password_rounds,
            },
        })
    }

    /// Check that the Gemini API key is configured.
    pub fn require_gemini(&self) -> Result<()> {
        if self.gemini_api_key.is_empty() {
            anyhow::bail!(
                "AI_INTEGRATIONS_GEMINI_API_KEY not set. Add it to your .env file.\n\
                 Or set CARECLOUD_ANALYZER=heuristic to run with local rules only."
            );
        }
        Ok(())
    }

    /// Check that sessions can be signed. Call before starting the web server.
    #[cfg(feature = "web")]
    pub fn require_session_secret(&self) -> Result<()> {
        if self.session_secret.len() < 16 {
            anyhow::bail!(
                "SECRET_KEY must be set to at least 16 characters. Add it to your .env file."
            );
        }
        Ok(())
    }
}

/// Accept a Flask-style `sqlite:///path` URL and return the file path.
pub fn sqlite_path_from_url(url: &str) -> Option<String> {
    let path = url.strip_prefix("sqlite:///")?;
    (!path.is_empty()).then(|| path.to_string())
}
