// HTTP mail API notifier.
//
// Posts a plain JSON message ({from, to, subject, text}) with bearer auth,
// the shape accepted by common transactional mail services.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{AlertNotifier, AlertSummary};

pub struct HttpMailNotifier {
    client: Client,
    url: String,
    api_key: String,
    from: String,
}

impl HttpMailNotifier {
    pub fn new(url: &str, api_key: &str, from: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("carecloud/0.1 (guardian-alerts)")
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

#[derive(Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

#[async_trait]
impl AlertNotifier for HttpMailNotifier {
    async fn notify(&self, guardian_email: &str, summary: &AlertSummary) -> Result<()> {
        let message = MailMessage {
            from: &self.from,
            to: [guardian_email],
            subject: summary.subject(),
            text: summary.body(),
        };

        let mut request = self.client.post(&self.url).json(&message);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.context("Failed to call mail API")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail API returned {}: {}", status, body);
        }

        debug!(tier = %summary.tier, "Mail API accepted alert");
        Ok(())
    }
}
