// Severity classifier: the toxicity-to-action decision policy.
//
// Maps a 0-100 toxicity score plus the detected category flags to a severity
// tier, a guardian-alert flag and the state the dashboard renders. Pure and
// deterministic: the same score and labels always give the same decision.
//
// The alert cut point (strictly above 70) and the risk cut point (40 and up)
// are separate constants on purpose. They answer different questions and are
// not meant to move together.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::labels::LabelSet;

/// Scores at or above this are Medium.
pub const MEDIUM_THRESHOLD: u8 = 40;
/// Scores at or above this are High.
pub const HIGH_THRESHOLD: u8 = 70;
/// Scores at or above this are Critical.
pub const CRITICAL_THRESHOLD: u8 = 90;
/// Scores strictly above this notify the guardian.
pub const ALERT_THRESHOLD: u8 = 70;
/// Scores at or above this render as Risk regardless of labels.
pub const RISK_THRESHOLD: u8 = 40;

/// Upper bound of the toxicity scale.
pub const MAX_SCORE: u8 = 100;

/// Coarse severity bucket derived from the toxicity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityTier {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityTier {
    /// Determine the tier from a clamped 0-100 score.
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= CRITICAL_THRESHOLD => SeverityTier::Critical,
            s if s >= HIGH_THRESHOLD => SeverityTier::High,
            s if s >= MEDIUM_THRESHOLD => SeverityTier::Medium,
            _ => SeverityTier::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Low => "Low",
            SeverityTier::Medium => "Medium",
            SeverityTier::High => "High",
            SeverityTier::Critical => "Critical",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the dashboard shows for a finished analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiState {
    Safe,
    Risk,
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Safe => "Safe",
            UiState::Risk => "Risk",
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The actionable outcome of one analysis. Recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub tier: SeverityTier,
    pub guardian_alert_required: bool,
    pub ui_state: UiState,
}

/// Classify a score and its labels.
///
/// Out-of-range scores are clamped to 0-100 first. A flagged category forces
/// the Risk state even when the score is low.
pub fn classify(score: i64, labels: &LabelSet) -> AlertDecision {
    let score = clamp_score(score);

    let ui_state = if score >= RISK_THRESHOLD || labels.any_flagged() {
        UiState::Risk
    } else {
        UiState::Safe
    };

    AlertDecision {
        tier: SeverityTier::from_score(score),
        guardian_alert_required: score > ALERT_THRESHOLD,
        ui_state,
    }
}

/// Clamp an arbitrary integer into the 0-100 score range.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, MAX_SCORE as i64) as u8
}

/// Read a toxicity score out of a collaborator JSON value.
///
/// Integers are clamped, floats are truncated toward zero, and strings holding
/// an integer are parsed. Anything else (missing, null, bool, free text,
/// non-finite numbers) is malformed and reads as 0.
pub fn coerce_score(value: &Value) -> u8 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                clamp_score(i)
            } else if let Some(u) = n.as_u64() {
                // Only reachable above i64::MAX.
                clamp_score(u.min(i64::MAX as u64) as i64)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() => clamp_score(f.trunc() as i64),
                    _ => 0,
                }
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map(clamp_score).unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::labels::Category;
    use serde_json::json;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(SeverityTier::from_score(39), SeverityTier::Low);
        assert_eq!(SeverityTier::from_score(40), SeverityTier::Medium);
        assert_eq!(SeverityTier::from_score(69), SeverityTier::Medium);
        assert_eq!(SeverityTier::from_score(70), SeverityTier::High);
        assert_eq!(SeverityTier::from_score(89), SeverityTier::High);
        assert_eq!(SeverityTier::from_score(90), SeverityTier::Critical);
    }

    #[test]
    fn test_alert_is_strictly_above_seventy() {
        let labels = LabelSet::new();
        assert!(!classify(70, &labels).guardian_alert_required);
        assert!(classify(71, &labels).guardian_alert_required);
    }

    #[test]
    fn test_flag_forces_risk_at_zero() {
        let mut labels = LabelSet::new();
        labels.flag(Category::Harassment);
        assert_eq!(classify(0, &labels).ui_state, UiState::Risk);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let labels = LabelSet::new();
        let low = classify(-25, &labels);
        assert_eq!(low.tier, SeverityTier::Low);
        assert_eq!(low.ui_state, UiState::Safe);

        let high = classify(450, &labels);
        assert_eq!(high.tier, SeverityTier::Critical);
        assert!(high.guardian_alert_required);
    }

    #[test]
    fn test_coerce_score_variants() {
        assert_eq!(coerce_score(&json!(85)), 85);
        assert_eq!(coerce_score(&json!(72.9)), 72);
        assert_eq!(coerce_score(&json!("64")), 64);
        assert_eq!(coerce_score(&json!(" 12 ")), 12);
        assert_eq!(coerce_score(&json!(-3)), 0);
        assert_eq!(coerce_score(&json!(180)), 100);
        assert_eq!(coerce_score(&json!(u64::MAX)), 100);
    }

    #[test]
    fn test_coerce_score_malformed_is_zero() {
        assert_eq!(coerce_score(&json!("high")), 0);
        assert_eq!(coerce_score(&json!("85.5")), 0);
        assert_eq!(coerce_score(&json!(null)), 0);
        assert_eq!(coerce_score(&json!(true)), 0);
        assert_eq!(coerce_score(&json!({"value": 90})), 0);
    }
}
