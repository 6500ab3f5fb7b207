// Analysis collaborators: trait-based so providers can be swapped.
//
// ContentAnalyzer scores text (and optionally an image); OcrEngine turns a
// screenshot into text. GeminiClient implements both. HeuristicAnalyzer runs
// locally from the child-safety rules.

pub mod gemini;
pub mod heuristic;
pub mod prompt;
pub mod rate_limiter;
pub mod traits;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{AnalyzerBackend, Config};
use traits::{ContentAnalyzer, OcrEngine, UnsupportedOcr};

/// Build the analyzer and OCR engine for the configured backend.
pub fn create_collaborators(config: &Config) -> Result<(Arc<dyn ContentAnalyzer>, Arc<dyn OcrEngine>)> {
    match config.analyzer_backend {
        AnalyzerBackend::Gemini => {
            config.require_gemini()?;
            info!(model = %config.gemini_model, "Using Gemini analyzer");
            let client = Arc::new(gemini::GeminiClient::new(
                &config.gemini_api_key,
                &config.gemini_model,
                &config.gemini_api_url,
                config.gemini_rpm,
            )?);
            let analyzer: Arc<dyn ContentAnalyzer> = client.clone();
            let ocr: Arc<dyn OcrEngine> = client;
            Ok((analyzer, ocr))
        }
        AnalyzerBackend::Heuristic => {
            info!("Using local heuristic analyzer (images unsupported)");
            let analyzer: Arc<dyn ContentAnalyzer> = Arc::new(heuristic::HeuristicAnalyzer);
            let ocr: Arc<dyn OcrEngine> = Arc::new(UnsupportedOcr);
            Ok((analyzer, ocr))
        }
    }
}
