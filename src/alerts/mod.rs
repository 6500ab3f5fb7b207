// Guardian alerts: notify the linked guardian when a result crosses the
// alert threshold.
//
// The summary carries only the tier and category flags. The submitted text
// never leaves the server in an alert.

pub mod mail;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::moderation::labels::Category;
use crate::moderation::result::AnalysisResult;
use crate::moderation::severity::SeverityTier;

/// What a guardian is told about a flagged submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSummary {
    pub tier: SeverityTier,
    pub categories: Vec<Category>,
    pub unrecognized_count: usize,
    pub occurred_at: DateTime<Utc>,
}

impl AlertSummary {
    /// Summarize a result, or `None` when it doesn't warrant an alert.
    pub fn from_result(result: &AnalysisResult, occurred_at: DateTime<Utc>) -> Option<Self> {
        let decision = result.decision();
        if !decision.guardian_alert_required {
            return None;
        }
        Some(Self {
            tier: decision.tier,
            categories: result.detected_labels.flagged(),
            unrecognized_count: result.detected_labels.unrecognized().len(),
            occurred_at,
        })
    }

    pub fn subject(&self) -> String {
        format!("CareCloud alert: {} severity content detected", self.tier)
    }

    pub fn body(&self) -> String {
        let mut lines = vec![
            "CareCloud flagged content submitted from your child's account.".to_string(),
            String::new(),
            format!("Severity: {}", self.tier),
            format!("When: {}", self.occurred_at.format("%Y-%m-%d %H:%M UTC")),
        ];

        if self.categories.is_empty() && self.unrecognized_count == 0 {
            lines.push("Categories: none specific (flagged by overall score)".to_string());
        } else {
            let mut names: Vec<String> = self
                .categories
                .iter()
                .map(|c| c.display_name().to_string())
                .collect();
            if self.unrecognized_count > 0 {
                names.push(format!("{} other", self.unrecognized_count));
            }
            lines.push(format!("Categories: {}", names.join(", ")));
        }

        lines.push(String::new());
        lines.push(
            "The message itself is not included. Please check in with your child \
             and review the dashboard together."
                .to_string(),
        );
        lines.join("\n")
    }
}

/// Delivers alerts to a guardian.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, guardian_email: &str, summary: &AlertSummary) -> Result<()>;
}

/// Notifier used when no mail API is configured: alerts only reach the log.
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, guardian_email: &str, summary: &AlertSummary) -> Result<()> {
        info!(
            guardian = %guardian_email,
            tier = %summary.tier,
            categories = summary.categories.len(),
            "Guardian alert (mail API not configured, logging only)"
        );
        Ok(())
    }
}

/// Send an alert if the result requires one.
///
/// Returns `true` only when an alert was delivered. Delivery failures are
/// logged and swallowed; they never fail the submission.
pub async fn deliver_alert(
    notifier: &dyn AlertNotifier,
    guardian_email: &str,
    result: &AnalysisResult,
) -> bool {
    let Some(summary) = AlertSummary::from_result(result, Utc::now()) else {
        return false;
    };

    match notifier.notify(guardian_email, &summary).await {
        Ok(()) => {
            info!(tier = %summary.tier, "Guardian alert sent");
            true
        }
        Err(e) => {
            warn!(error = %e, tier = %summary.tier, "Guardian alert delivery failed");
            false
        }
    }
}

/// Build the notifier for the current configuration.
pub fn create_notifier(config: &Config) -> Result<Arc<dyn AlertNotifier>> {
    match config.mail_api_url {
        Some(ref url) => {
            info!(url = %url, "Guardian alerts via mail API");
            Ok(Arc::new(mail::HttpMailNotifier::new(
                url,
                &config.mail_api_key,
                &config.mail_from,
            )?))
        }
        None => Ok(Arc::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::labels::LabelSet;
    use tokio::sync::Mutex;

    struct Recording(Mutex<Vec<(String, AlertSummary)>>);

    #[async_trait]
    impl AlertNotifier for Recording {
        async fn notify(&self, guardian_email: &str, summary: &AlertSummary) -> Result<()> {
            self.0
                .lock()
                .await
                .push((guardian_email.to_string(), summary.clone()));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl AlertNotifier for Failing {
        async fn notify(&self, _: &str, _: &AlertSummary) -> Result<()> {
            anyhow::bail!("smtp relay down")
        }
    }

    fn result(score: u8, labels: LabelSet) -> AnalysisResult {
        AnalysisResult {
            toxicity_score: score,
            detected_labels: labels,
            ..AnalysisResult::safe_default()
        }
    }

    #[tokio::test]
    async fn test_no_alert_at_threshold() {
        let notifier = Recording(Mutex::new(Vec::new()));
        assert!(!deliver_alert(&notifier, "mom@example.com", &result(70, LabelSet::new())).await);
        assert!(notifier.0.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_alert_above_threshold() {
        let mut labels = LabelSet::new();
        labels.flag(Category::Grooming);
        let notifier = Recording(Mutex::new(Vec::new()));

        assert!(deliver_alert(&notifier, "mom@example.com", &result(88, labels)).await);

        let sent = notifier.0.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "mom@example.com");
        assert_eq!(sent[0].1.tier, SeverityTier::High);
        assert_eq!(sent[0].1.categories, vec![Category::Grooming]);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        assert!(!deliver_alert(&Failing, "dad@example.com", &result(99, LabelSet::new())).await);
    }

    #[test]
    fn test_body_never_contains_submission() {
        let mut r = result(95, LabelSet::new());
        r.explanation = "secret words from the chat".to_string();
        let summary = AlertSummary::from_result(&r, Utc::now()).unwrap();
        assert!(!summary.body().contains("secret words"));
        assert!(summary.body().contains("Severity: Critical"));
        assert!(summary.subject().contains("Critical"));
    }
}
