// Google Gemini implementation of ContentAnalyzer and OcrEngine.
//
// Both operations go through `models/{model}:generateContent`. Scoring asks
// for a JSON object; the model sometimes wraps it in prose or a code fence,
// so the reply is trimmed to the outermost braces before parsing.
//
// API docs: https://ai.google.dev/api/generate-content

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::prompt::{analysis_prompt, OCR_PROMPT};
use super::rate_limiter::RateLimiter;
use super::traits::{ContentAnalyzer, ImageInput, OcrEngine};
use crate::output::truncate_chars;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model; multimodal so screenshots can be scored directly.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str, requests_per_minute: u32) -> Result<Self> {
        let client = Client::builder()
            .user_agent("carecloud/0.1 (child-safety moderation)")
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::per_minute(requests_per_minute),
        })
    }

    /// Send one prompt (plus optional image) and return the reply text.
    async fn generate(&self, prompt: String, image: Option<&ImageInput>, json_reply: bool) -> Result<String> {
        self.rate_limiter.acquire().await;

        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(image) = image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: BASE64.encode(&image.bytes),
                },
            });
        }

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                response_mime_type: json_reply.then(|| "application/json".to_string()),
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API returned {}: {}", status, truncate_chars(&body, 300));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        reply
            .text()
            .context("Gemini API response contained no text candidates")
    }
}

#[async_trait]
impl ContentAnalyzer for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn analyze(&self, text: &str, image: Option<&ImageInput>) -> Result<Value> {
        let reply = self
            .generate(analysis_prompt(text, image.is_some()), image, true)
            .await?;

        let json = extract_json_object(&reply)
            .with_context(|| format!("Gemini reply had no JSON object: {}", truncate_chars(&reply, 120)))?;
        let value: Value =
            serde_json::from_str(json).context("Gemini reply was not valid JSON")?;

        debug!(
            model = %self.model,
            toxicity_score = %value.get("toxicity_score").unwrap_or(&serde_json::Value::Null),
            "Gemini analysis complete"
        );

        Ok(value)
    }
}

#[async_trait]
impl OcrEngine for GeminiClient {
    async fn extract_text(&self, image: &ImageInput) -> Result<String> {
        let reply = self
            .generate(OCR_PROMPT.to_string(), Some(image), false)
            .await
            .context("Screenshot transcription failed")?;
        let text = reply.trim().to_string();
        debug!(chars = text.chars().count(), "Transcribed screenshot");
        Ok(text)
    }
}

/// Slice out the outermost `{ ... }` of a model reply.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

// --- Gemini API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate that has any.
    pub fn text(&self) -> Option<String> {
        self.candidates.iter().find_map(|candidate| {
            let parts = &candidate.content.as_ref()?.parts;
            let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
            (!text.is_empty()).then_some(text)
        })
    }
}
