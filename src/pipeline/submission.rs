// Submission pipeline: OCR → AI analysis → safety floor → classification.
//
// Collaborator calls run one at a time. Any collaborator error aborts the
// whole submission; nothing is retried here.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analysis::traits::{ContentAnalyzer, ImageInput, OcrEngine};
use crate::moderation::result::AnalysisResult;
use crate::moderation::safety;
use crate::moderation::severity::AlertDecision;

/// Raw input from one user submission.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub text: String,
    pub image: Option<ImageInput>,
}

/// Where the analyzed content came from, stored alongside each analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionSource {
    Empty,
    Text,
    Image,
    TextAndImage,
}

impl SubmissionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionSource::Empty => "empty",
            SubmissionSource::Text => "text",
            SubmissionSource::Image => "image",
            SubmissionSource::TextAndImage => "text+image",
        }
    }
}

impl Submission {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn source(&self) -> SubmissionSource {
        match (self.text.trim().is_empty(), self.image.is_some()) {
            (true, false) => SubmissionSource::Empty,
            (false, false) => SubmissionSource::Text,
            (true, true) => SubmissionSource::Image,
            (false, true) => SubmissionSource::TextAndImage,
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub result: AnalysisResult,
    pub decision: AlertDecision,
    /// Submitted text plus any OCR transcript; this is what the rules saw.
    pub analyzed_text: String,
    pub source: SubmissionSource,
}

/// Run one submission through the collaborators and the decision policy.
///
/// Empty submissions never reach a collaborator: they score 0 and read Safe.
pub async fn assess(
    analyzer: &dyn ContentAnalyzer,
    ocr: &dyn OcrEngine,
    submission: &Submission,
) -> Result<Assessment> {
    let source = submission.source();
    let typed = submission.text.trim();

    if source == SubmissionSource::Empty {
        debug!("Empty submission, skipping analysis");
        let result = AnalysisResult::safe_default();
        return Ok(Assessment {
            decision: result.decision(),
            result,
            analyzed_text: String::new(),
            source,
        });
    }

    let transcript = match submission.image {
        Some(ref image) => ocr
            .extract_text(image)
            .await
            .context("Could not read text from the screenshot")?,
        None => String::new(),
    };

    let analyzed_text = match (typed.is_empty(), transcript.is_empty()) {
        (false, false) => format!("{typed}\n{transcript}"),
        (false, true) => typed.to_string(),
        (true, _) => transcript,
    };

    let raw = analyzer
        .analyze(&analyzed_text, submission.image.as_ref())
        .await
        .with_context(|| format!("{} analysis failed", analyzer.name()))?;

    let result = safety::enforce(AnalysisResult::from_collaborator_json(&raw), &analyzed_text);
    let decision = result.decision();

    info!(
        source = source.as_str(),
        score = result.toxicity_score,
        tier = %decision.tier,
        ui_state = %decision.ui_state,
        alert = decision.guardian_alert_required,
        "Submission assessed"
    );

    Ok(Assessment {
        result,
        decision,
        analyzed_text,
        source,
    })
}
