// Child-safety floor: local rules applied on top of the AI collaborator.
//
// The model can under-score polite grooming language or miss a self-harm
// statement. These deterministic rules look at the submitted text (including
// any OCR output) and can only raise the score or add flags, never lower
// either one.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use super::labels::Category;
use super::result::AnalysisResult;

/// Minimum score when profanity or an insult is present.
pub const PROFANITY_FLOOR: u8 = 60;
/// Minimum score when grooming language is present.
pub const GROOMING_FLOOR: u8 = 75;
/// Minimum score when self-harm language is present.
pub const SELF_HARM_FLOOR: u8 = 75;

static PROFANITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(fuck\w*|shit\w*|bitch\w*|asshole\w*|ugly|stupid)\b")
        .expect("Invalid profanity pattern")
});

static SELF_HARM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(kill(ing)? (myself|yourself)|end(ing)? (my|your) life|want(ed)? to die|hurt(ing)? myself|cut(ting)? myself|kys)\b",
    )
    .expect("Invalid self-harm pattern")
});

/// Phrases matched against lowercased text with curly apostrophes straightened.
const GROOMING_PHRASES: &[&str] = &[
    "come sit on my lap",
    "you are cute",
    "you are so mature",
    "you're so mature",
    "our secret",
    "our little secret",
    "don't tell your parents",
    "dont tell your parents",
    "send me a picture",
    "send me a pic",
    "i can take care of you",
    "i understand you better than others",
];

/// Which local rules fired for a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentSignals {
    pub profanity: bool,
    pub grooming: bool,
    pub self_harm: bool,
}

impl IntentSignals {
    pub fn any(&self) -> bool {
        self.profanity || self.grooming || self.self_harm
    }
}

pub fn detect_intent(text: &str) -> IntentSignals {
    let normalized = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    IntentSignals {
        profanity: PROFANITY.is_match(&normalized),
        grooming: GROOMING_PHRASES.iter().any(|p| normalized.contains(p)),
        self_harm: SELF_HARM.is_match(&normalized),
    }
}

/// Apply the safety floor to a collaborator result.
pub fn enforce(mut result: AnalysisResult, text: &str) -> AnalysisResult {
    let intent = detect_intent(text);
    if !intent.any() {
        return result;
    }

    let before = result.toxicity_score;
    let labels = &mut result.detected_labels;

    if intent.profanity {
        result.toxicity_score = result.toxicity_score.max(PROFANITY_FLOOR);
        labels.flag(Category::Profanity);
    }
    if intent.grooming {
        result.toxicity_score = result.toxicity_score.max(GROOMING_FLOOR);
        labels.flag(Category::Grooming);
        labels.flag(Category::Manipulation);
        labels.flag(Category::SexualContent);
    }
    if intent.self_harm {
        result.toxicity_score = result.toxicity_score.max(SELF_HARM_FLOOR);
        labels.flag(Category::SelfHarm);
    }

    debug!(
        before,
        after = result.toxicity_score,
        profanity = intent.profanity,
        grooming = intent.grooming,
        self_harm = intent.self_harm,
        "Applied child-safety floor"
    );

    result
}
