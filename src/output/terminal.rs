// Colored terminal output for decisions and analysis history.

use colored::Colorize;

use crate::db::models::StoredAnalysis;
use crate::moderation::result::DecisionPayload;
use crate::moderation::severity::{SeverityTier, UiState};

/// Display one decision in full.
pub fn display_decision(payload: &DecisionPayload) {
    println!("\n{}", "=== Analysis Result ===".bold());
    println!(
        "  Score: {}/100   Severity: {}   State: {}",
        payload.toxicity_score,
        colorize_tier(payload.severity_level),
        colorize_state(payload.ui_state),
    );
    println!("  Labels: {}", payload.display_labels.join(", "));

    let alert = if payload.guardian_alert_required {
        "yes".red().bold().to_string()
    } else {
        "no".green().to_string()
    };
    println!("  Guardian alert: {alert}");

    if !payload.explanation.is_empty() {
        println!("\n  {}", payload.explanation);
    }
    if !payload.support_message.is_empty() {
        println!("  {}", payload.support_message.italic());
    }
    if !payload.safe_response_steps.is_empty() {
        println!("\n  What to do:");
        for (i, step) in payload.safe_response_steps.iter().enumerate() {
            println!("    {}. {}", i + 1, step);
        }
    }
    println!();
}

/// Display a list of stored analyses, newest first.
pub fn display_history(analyses: &[StoredAnalysis]) {
    if analyses.is_empty() {
        println!("No analyses recorded yet.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Recent Analyses ({}) ===", analyses.len()).bold()
    );
    println!();
    println!(
        "  {:>5}  {:<19}  {:>5}  {:<8}  {:<5}  {}",
        "ID".dimmed(),
        "When".dimmed(),
        "Score".dimmed(),
        "Tier".dimmed(),
        "Alert".dimmed(),
        "Preview".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for analysis in analyses {
        let decision = analysis.result().decision();
        let alert = if analysis.guardian_alerted { "sent" } else { "-" };
        println!(
            "  {:>5}  {:<19}  {:>5}  {:<8}  {:<5}  {}",
            analysis.id,
            analysis.created_at,
            analysis.toxicity_score,
            colorize_tier(decision.tier),
            alert,
            super::truncate_chars(&analysis.content_preview, 40).dimmed(),
        );
    }
    println!();
}

fn colorize_tier(tier: SeverityTier) -> colored::ColoredString {
    let s = tier.as_str();
    match tier {
        SeverityTier::Critical => s.red().bold(),
        SeverityTier::High => s.bright_red(),
        SeverityTier::Medium => s.yellow(),
        SeverityTier::Low => s.green(),
    }
}

fn colorize_state(state: UiState) -> colored::ColoredString {
    match state {
        UiState::Risk => state.as_str().red(),
        UiState::Safe => state.as_str().green(),
    }
}
