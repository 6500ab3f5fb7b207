// Local rule-based analyzer: no API key, no network.
//
// Scores text using only the child-safety rules. Useful for development and
// tests, and as a fallback deployment when no Gemini key is available. It
// cannot see images; pair it with `UnsupportedOcr`.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::traits::{ContentAnalyzer, ImageInput};
use crate::moderation::safety::{detect_intent, GROOMING_FLOOR, PROFANITY_FLOOR, SELF_HARM_FLOOR};

pub struct HeuristicAnalyzer;

#[async_trait]
impl ContentAnalyzer for HeuristicAnalyzer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn analyze(&self, text: &str, image: Option<&ImageInput>) -> Result<Value> {
        if image.is_some() && text.trim().is_empty() {
            anyhow::bail!("The heuristic analyzer cannot read images");
        }

        let intent = detect_intent(text);
        let mut score = 0u8;
        let mut reasons = Vec::new();
        if intent.profanity {
            score = score.max(PROFANITY_FLOOR);
            reasons.push("profanity or insults");
        }
        if intent.grooming {
            score = score.max(GROOMING_FLOOR);
            reasons.push("grooming language");
        }
        if intent.self_harm {
            score = score.max(SELF_HARM_FLOOR);
            reasons.push("self-harm language");
        }

        let explanation = if reasons.is_empty() {
            "No harmful patterns were found by the local safety rules.".to_string()
        } else {
            format!("Local safety rules found {}.", reasons.join(" and "))
        };

        Ok(json!({
            "toxicity_score": score,
            "explanation": explanation,
            "detected_labels": {
                "profanity": intent.profanity,
                "grooming": intent.grooming,
                "self_harm": intent.self_harm,
            },
        }))
    }
}
