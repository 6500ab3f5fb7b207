// Analysis results and the decision payload sent back to the client.

use serde::Serialize;
use serde_json::Value;

use super::labels::LabelSet;
use super::severity::{classify, coerce_score, AlertDecision, SeverityTier, UiState};

pub const DEFAULT_EXPLANATION: &str =
    "This message may be harmful or inappropriate for a child.";

pub const DEFAULT_SUPPORT_MESSAGE: &str =
    "This message crosses boundaries. You did nothing wrong, and it's okay to feel uncomfortable.";

pub const DEFAULT_SAFE_RESPONSE_STEPS: [&str; 4] = [
    "Do not reply to the message",
    "Block or report the sender",
    "Tell a parent, teacher, or trusted adult",
    "Save screenshots if needed",
];

/// One analyzed submission. Built once, never mutated after the safety floor.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub toxicity_score: u8,
    pub detected_labels: LabelSet,
    pub explanation: String,
    pub support_message: String,
    pub safe_response_steps: Vec<String>,
}

impl AnalysisResult {
    /// A benign result for empty or unusable input.
    pub fn safe_default() -> Self {
        Self {
            toxicity_score: 0,
            detected_labels: LabelSet::new(),
            explanation: "No content to analyze.".to_string(),
            support_message: String::new(),
            safe_response_steps: Vec::new(),
        }
    }

    /// Build a result from the collaborator's JSON object.
    ///
    /// Only the score is load-bearing; it reads as 0 when malformed. Missing
    /// text fields fall back to the stock guidance shown to the child.
    pub fn from_collaborator_json(raw: &Value) -> Self {
        let toxicity_score = coerce_score(raw.get("toxicity_score").unwrap_or(&Value::Null));
        let detected_labels =
            LabelSet::from_json(raw.get("detected_labels").unwrap_or(&Value::Null));

        let explanation = non_empty_str(raw.get("explanation"))
            .unwrap_or(DEFAULT_EXPLANATION)
            .to_string();
        let support_message = non_empty_str(raw.get("victim_support_message"))
            .or_else(|| non_empty_str(raw.get("support_message")))
            .unwrap_or(DEFAULT_SUPPORT_MESSAGE)
            .to_string();

        let safe_response_steps: Vec<String> = raw
            .get("safe_response_steps")
            .and_then(Value::as_array)
            .map(|steps| {
                steps
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let safe_response_steps = if safe_response_steps.is_empty() {
            default_steps()
        } else {
            safe_response_steps
        };

        Self {
            toxicity_score,
            detected_labels,
            explanation,
            support_message,
            safe_response_steps,
        }
    }

    /// Derive the alert decision for this result.
    pub fn decision(&self) -> AlertDecision {
        classify(self.toxicity_score as i64, &self.detected_labels)
    }
}

pub fn default_steps() -> Vec<String> {
    DEFAULT_SAFE_RESPONSE_STEPS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Client-facing response for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionPayload {
    pub analysis_id: Option<i64>,
    pub toxicity_score: u8,
    pub severity_level: SeverityTier,
    pub ui_state: UiState,
    pub detected_labels: Value,
    pub display_labels: Vec<String>,
    pub guardian_alert_required: bool,
    pub explanation: String,
    pub support_message: String,
    pub safe_response_steps: Vec<String>,
}

impl DecisionPayload {
    pub fn new(result: &AnalysisResult, analysis_id: Option<i64>) -> Self {
        let decision = result.decision();
        Self {
            analysis_id,
            toxicity_score: result.toxicity_score,
            severity_level: decision.tier,
            ui_state: decision.ui_state,
            detected_labels: result.detected_labels.to_json(),
            display_labels: result.detected_labels.display_labels(result.toxicity_score),
            guardian_alert_required: decision.guardian_alert_required,
            explanation: result.explanation.clone(),
            support_message: result.support_message.clone(),
            safe_response_steps: result.safe_response_steps.clone(),
        }
    }
}
