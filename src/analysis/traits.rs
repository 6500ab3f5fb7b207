// Analysis collaborator traits: swappable AI and OCR providers.
//
// The rest of the pipeline only sees these traits. The Gemini backend talks
// to Google's generative API; the heuristic backend runs the local safety
// rules so the dashboard works without an API key.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// An uploaded screenshot.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// MIME type as reported by the client (e.g. `image/png`)
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Scores content for harm. The returned JSON object is treated as opaque
/// apart from its `toxicity_score` and `detected_labels` keys.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Analyze the submitted text, with the original image when there is one.
    async fn analyze(&self, text: &str, image: Option<&ImageInput>) -> Result<Value>;
}

/// Pulls readable text out of a screenshot.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image: &ImageInput) -> Result<String>;
}

/// OCR backend for configurations that can't read images.
/// Fails every call so an image submission surfaces an error instead of
/// being silently scored as empty text.
pub struct UnsupportedOcr;

#[async_trait]
impl OcrEngine for UnsupportedOcr {
    async fn extract_text(&self, _image: &ImageInput) -> Result<String> {
        anyhow::bail!("Image analysis needs the Gemini backend (set CARECLOUD_ANALYZER=gemini)")
    }
}
