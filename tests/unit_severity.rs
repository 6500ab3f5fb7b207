// Severity classifier tests: tier boundaries, alert threshold, display state.
//
// Pure functions only: no collaborators, no database.

use carecloud::moderation::labels::{Category, LabelSet};
use carecloud::moderation::result::{AnalysisResult, DecisionPayload};
use carecloud::moderation::severity::{classify, SeverityTier, UiState};
use serde_json::json;

fn no_labels() -> LabelSet {
    LabelSet::new()
}

fn labels(value: serde_json::Value) -> LabelSet {
    LabelSet::from_json(&value)
}

// ============================================================
// Tier boundaries
// ============================================================

#[test]
fn tier_boundaries() {
    let cases = [
        (0, SeverityTier::Low),
        (39, SeverityTier::Low),
        (40, SeverityTier::Medium),
        (69, SeverityTier::Medium),
        (70, SeverityTier::High),
        (89, SeverityTier::High),
        (90, SeverityTier::Critical),
        (100, SeverityTier::Critical),
    ];
    for (score, expected) in cases {
        assert_eq!(classify(score, &no_labels()).tier, expected, "score {score}");
    }
}

#[test]
fn tier_never_decreases_as_score_rises() {
    let mut previous = SeverityTier::Low;
    for score in 0..=100 {
        let tier = classify(score, &no_labels()).tier;
        assert!(tier >= previous, "tier dropped at {score}");
        previous = tier;
    }
}

#[test]
fn out_of_range_scores_are_clamped() {
    assert_eq!(classify(-20, &no_labels()).tier, SeverityTier::Low);
    assert_eq!(classify(-20, &no_labels()).ui_state, UiState::Safe);

    let over = classify(250, &no_labels());
    assert_eq!(over.tier, SeverityTier::Critical);
    assert!(over.guardian_alert_required);
}

// ============================================================
// Guardian alert
// ============================================================

#[test]
fn alert_requires_score_strictly_above_seventy() {
    assert!(!classify(70, &no_labels()).guardian_alert_required);
    assert!(classify(71, &no_labels()).guardian_alert_required);
}

#[test]
fn labels_alone_never_trigger_an_alert() {
    let flagged = labels(json!({ "grooming": true, "self_harm": true }));
    assert!(!classify(30, &flagged).guardian_alert_required);
}

// ============================================================
// Display state
// ============================================================

#[test]
fn risk_threshold_is_forty() {
    assert_eq!(classify(39, &no_labels()).ui_state, UiState::Safe);
    assert_eq!(classify(40, &no_labels()).ui_state, UiState::Risk);
}

#[test]
fn any_flag_forces_risk_even_at_zero() {
    let flagged = labels(json!({ "harassment": true }));
    assert_eq!(classify(0, &flagged).ui_state, UiState::Risk);
}

#[test]
fn unflagged_labels_do_not_force_risk() {
    let unflagged = labels(json!({ "harassment": false, "violence": 0.2 }));
    assert_eq!(classify(10, &unflagged).ui_state, UiState::Safe);
}

#[test]
fn unrecognized_flag_forces_risk() {
    let odd = labels(json!({ "doxxing": true }));
    assert_eq!(odd.flagged(), Vec::<Category>::new());
    assert_eq!(classify(5, &odd).ui_state, UiState::Risk);
}

#[test]
fn classification_is_deterministic() {
    let flagged = labels(json!({ "violence": true }));
    for score in [0, 40, 71, 95] {
        assert_eq!(classify(score, &flagged), classify(score, &flagged));
    }
}

// ============================================================
// End-to-end scenarios through DecisionPayload
// ============================================================

fn result(score: u8, detected: serde_json::Value) -> AnalysisResult {
    AnalysisResult::from_collaborator_json(&json!({
        "toxicity_score": score,
        "detected_labels": detected,
    }))
}

#[test]
fn critical_harassment_scenario() {
    let payload = DecisionPayload::new(&result(95, json!({ "harassment": true })), Some(1));
    assert_eq!(payload.severity_level, SeverityTier::Critical);
    assert_eq!(payload.ui_state, UiState::Risk);
    assert!(payload.guardian_alert_required);
    assert_eq!(payload.display_labels, vec!["Harassment"]);
}

#[test]
fn benign_message_scenario() {
    let payload = DecisionPayload::new(&result(10, json!({})), None);
    assert_eq!(payload.severity_level, SeverityTier::Low);
    assert_eq!(payload.ui_state, UiState::Safe);
    assert!(!payload.guardian_alert_required);
    assert_eq!(payload.display_labels, vec!["Safe"]);
}

#[test]
fn medium_grooming_scenario() {
    let payload = DecisionPayload::new(&result(65, json!({ "grooming": true })), None);
    assert_eq!(payload.severity_level, SeverityTier::Medium);
    assert_eq!(payload.ui_state, UiState::Risk);
    assert!(!payload.guardian_alert_required);
    assert_eq!(payload.display_labels, vec!["Grooming Risk"]);
}

#[test]
fn unlabelled_high_score_reads_unsafe() {
    let payload = DecisionPayload::new(&result(55, json!({})), None);
    assert_eq!(payload.ui_state, UiState::Risk);
    assert_eq!(payload.display_labels, vec!["Unsafe content detected"]);
}

#[test]
fn payload_serializes_for_the_dashboard() {
    let payload = DecisionPayload::new(&result(80, json!({ "violence": true })), Some(9));
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(value["analysis_id"], 9);
    assert_eq!(value["severity_level"], "High");
    assert_eq!(value["ui_state"], "Risk");
    assert_eq!(value["guardian_alert_required"], true);
    assert_eq!(value["detected_labels"]["violence"], true);
}
