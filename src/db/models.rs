// Data models: Rust structs that map to database rows.
//
// Kept separate from the queries so the web layer and CLI can use them
// without depending on rusqlite directly.

use serde::Serialize;

use crate::moderation::labels::LabelSet;
use crate::moderation::result::AnalysisResult;

/// A registered dashboard user and the guardian linked to them.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub guardian_email: String,
    pub created_at: String,
}

/// Fields needed to record a finished analysis.
#[derive(Debug, Clone)]
pub struct NewAnalysis<'a> {
    pub user_id: i64,
    pub result: &'a AnalysisResult,
    pub content_preview: &'a str,
    pub source: &'a str,
}

/// A persisted analysis row.
///
/// Only the score and labels are stored; tier, alert flag and display state
/// are recomputed from them via `result().decision()`.
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub id: i64,
    pub user_id: i64,
    pub created_at: String,
    pub toxicity_score: u8,
    pub labels: LabelSet,
    pub explanation: String,
    pub support_message: String,
    pub safe_response_steps: Vec<String>,
    pub content_preview: String,
    pub source: String,
    pub guardian_alerted: bool,
}

impl StoredAnalysis {
    pub fn result(&self) -> AnalysisResult {
        AnalysisResult {
            toxicity_score: self.toxicity_score,
            detected_labels: self.labels.clone(),
            explanation: self.explanation.clone(),
            support_message: self.support_message.clone(),
            safe_response_steps: self.safe_response_steps.clone(),
        }
    }
}

/// Row counts shown by `carecloud status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DbStats {
    pub users: i64,
    pub analyses: i64,
    pub alerts_sent: i64,
    pub last_analysis_at: Option<String>,
}
