// Harmful-content categories and the per-submission label set.
//
// The AI collaborator answers with an open-ended JSON object of category
// flags. Only the fixed set of categories below is trusted; any other key it
// flags is kept by name as "unrecognized" so it still counts toward the risk
// display, but it never drives anything else.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::severity::RISK_THRESHOLD;

/// Label shown when nothing is flagged and the score is below the risk threshold.
pub const SYNTHETIC_SAFE_LABEL: &str = "Safe";

/// Label shown when nothing is flagged but the score alone signals risk.
pub const SYNTHETIC_UNSAFE_LABEL: &str = "Unsafe content detected";

/// Confidence at or above which a numeric label value counts as flagged.
pub const CONFIDENCE_FLAG_THRESHOLD: f64 = 0.5;

/// The harmful-content categories the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Profanity,
    Harassment,
    Manipulation,
    Grooming,
    SexualContent,
    Violence,
    Gore,
    HateSpeech,
    SelfHarm,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Profanity,
        Category::Harassment,
        Category::Manipulation,
        Category::Grooming,
        Category::SexualContent,
        Category::Violence,
        Category::Gore,
        Category::HateSpeech,
        Category::SelfHarm,
    ];

    /// Wire key used in the collaborator prompt, the DB and the client payload.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Profanity => "profanity",
            Category::Harassment => "harassment",
            Category::Manipulation => "manipulation",
            Category::Grooming => "grooming",
            Category::SexualContent => "sexual_content",
            Category::Violence => "violence",
            Category::Gore => "gore",
            Category::HateSpeech => "hate_speech",
            Category::SelfHarm => "self_harm",
        }
    }

    /// Human-readable name for the dashboard.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Profanity => "Profanity",
            Category::Harassment => "Harassment",
            Category::Manipulation => "Manipulation",
            Category::Grooming => "Grooming Risk",
            Category::SexualContent => "Sexual Content",
            Category::Violence => "Violence",
            Category::Gore => "Graphic Content",
            Category::HateSpeech => "Hate Speech",
            Category::SelfHarm => "Self-Harm Risk",
        }
    }

    /// Map a collaborator-supplied key onto a known category.
    ///
    /// Keys are normalized first (case, surrounding whitespace, `-` or space
    /// separators), so `"Self-Harm"` and `"self_harm"` both resolve. A few
    /// common synonyms the model tends to invent are accepted as well.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "profanity" | "swearing" => Some(Category::Profanity),
            "harassment" | "bullying" | "insult" | "insults" => Some(Category::Harassment),
            "manipulation" | "coercion" => Some(Category::Manipulation),
            "grooming" => Some(Category::Grooming),
            "sexual_content" | "sexual" => Some(Category::SexualContent),
            "violence" | "threat" | "threats" => Some(Category::Violence),
            "gore" => Some(Category::Gore),
            "hate_speech" | "hate" => Some(Category::HateSpeech),
            "self_harm" | "selfharm" => Some(Category::SelfHarm),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Category flags detected for one submission.
///
/// Known categories map to a boolean. Unrecognized keys are only retained
/// when the collaborator flagged them, sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    flags: BTreeMap<Category, bool>,
    unrecognized: Vec<String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a label set from the collaborator's `detected_labels` value.
    ///
    /// Anything that isn't a JSON object yields an empty set.
    pub fn from_json(value: &Value) -> Self {
        let mut labels = Self::new();
        let Some(map) = value.as_object() else {
            return labels;
        };

        for (key, raw) in map {
            let flagged = coerce_flag(raw);
            match Category::from_key(key) {
                // A synonym may land on a category already seen; never un-flag it.
                Some(category) => {
                    let entry = labels.flags.entry(category).or_insert(false);
                    *entry |= flagged;
                }
                None if flagged => labels.flag_unrecognized(key),
                None => {}
            }
        }
        labels
    }

    /// Set a known category's flag explicitly.
    pub fn set(&mut self, category: Category, flagged: bool) {
        self.flags.insert(category, flagged);
    }

    /// Mark a known category as detected.
    pub fn flag(&mut self, category: Category) {
        self.set(category, true);
    }

    /// Record a flagged key the fixed category set doesn't cover.
    pub fn flag_unrecognized(&mut self, key: &str) {
        let key = key.trim().to_string();
        if key.is_empty() {
            return;
        }
        if let Err(pos) = self.unrecognized.binary_search(&key) {
            self.unrecognized.insert(pos, key);
        }
    }

    pub fn is_flagged(&self, category: Category) -> bool {
        self.flags.get(&category).copied().unwrap_or(false)
    }

    /// True when any category, known or not, is flagged.
    pub fn any_flagged(&self) -> bool {
        self.flags.values().any(|&f| f) || !self.unrecognized.is_empty()
    }

    /// Known categories that are flagged, in declaration order.
    pub fn flagged(&self) -> Vec<Category> {
        self.flags
            .iter()
            .filter(|(_, f)| **f)
            .map(|(&c, _)| c)
            .collect()
    }

    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    /// Serialize back to a flat `{key: bool}` object.
    ///
    /// Known categories keep whatever value they were given (including
    /// explicit `false`); unrecognized keys are always `true`.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (category, flagged) in &self.flags {
            map.insert(category.key().to_string(), Value::Bool(*flagged));
        }
        for key in &self.unrecognized {
            map.entry(key.clone()).or_insert(Value::Bool(true));
        }
        Value::Object(map)
    }

    /// Labels to show the user for this set at the given score.
    ///
    /// Falls back to a single synthetic label, chosen by the risk threshold,
    /// when nothing is flagged.
    pub fn display_labels(&self, score: u8) -> Vec<String> {
        if !self.any_flagged() {
            let label = if score >= RISK_THRESHOLD {
                SYNTHETIC_UNSAFE_LABEL
            } else {
                SYNTHETIC_SAFE_LABEL
            };
            return vec![label.to_string()];
        }

        self.flagged()
            .into_iter()
            .map(|c| c.display_name().to_string())
            .chain(self.unrecognized.iter().map(|k| format!("Unrecognized: {k}")))
            .collect()
    }
}

/// Interpret a single label value from the collaborator.
///
/// Booleans are taken as-is, numbers are confidences, and the strings
/// `"true"` / `"yes"` count as flagged. Everything else is unflagged.
pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|c| c >= CONFIDENCE_FLAG_THRESHOLD),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_key_normalizes_separators_and_case() {
        assert_eq!(Category::from_key("Self-Harm"), Some(Category::SelfHarm));
        assert_eq!(Category::from_key(" hate speech "), Some(Category::HateSpeech));
        assert_eq!(Category::from_key("SEXUAL_CONTENT"), Some(Category::SexualContent));
        assert_eq!(Category::from_key("spam"), None);
    }

    #[test]
    fn test_every_key_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
    }

    #[test]
    fn test_from_json_mixed_values() {
        let labels = LabelSet::from_json(&json!({
            "harassment": true,
            "grooming": 0.82,
            "violence": 0.1,
            "profanity": "yes",
            "gore": null,
            "crypto_scam": true,
            "spam": false
        }));

        assert!(labels.is_flagged(Category::Harassment));
        assert!(labels.is_flagged(Category::Grooming));
        assert!(labels.is_flagged(Category::Profanity));
        assert!(!labels.is_flagged(Category::Violence));
        assert!(!labels.is_flagged(Category::Gore));
        assert_eq!(labels.unrecognized(), &["crypto_scam".to_string()]);
    }

    #[test]
    fn test_synonym_does_not_unflag() {
        let labels = LabelSet::from_json(&json!({ "bullying": true, "harassment": false }));
        assert!(labels.is_flagged(Category::Harassment));
    }

    #[test]
    fn test_non_object_is_empty() {
        assert!(!LabelSet::from_json(&json!(["harassment"])).any_flagged());
        assert!(!LabelSet::from_json(&json!(null)).any_flagged());
    }

    #[test]
    fn test_to_json_keeps_explicit_false() {
        let mut labels = LabelSet::new();
        labels.set(Category::Gore, false);
        labels.flag(Category::Violence);
        labels.flag_unrecognized("doxxing");

        let value = labels.to_json();
        assert_eq!(value["gore"], json!(false));
        assert_eq!(value["violence"], json!(true));
        assert_eq!(value["doxxing"], json!(true));
        assert_eq!(LabelSet::from_json(&value).flagged(), vec![Category::Violence]);
    }

    #[test]
    fn test_display_labels_synthetic_fallback() {
        let empty = LabelSet::new();
        assert_eq!(empty.display_labels(10), vec![SYNTHETIC_SAFE_LABEL]);
        assert_eq!(empty.display_labels(40), vec![SYNTHETIC_UNSAFE_LABEL]);
    }

    #[test]
    fn test_display_labels_named() {
        let mut labels = LabelSet::new();
        labels.flag(Category::SelfHarm);
        labels.flag_unrecognized("doxxing");
        assert_eq!(
            labels.display_labels(0),
            vec!["Self-Harm Risk".to_string(), "Unrecognized: doxxing".to_string()]
        );
    }
}
