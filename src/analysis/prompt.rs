// Prompt text sent to the generative model.

use crate::moderation::labels::Category;

/// Build the child-safety scoring prompt for a submission.
pub fn analysis_prompt(text: &str, has_image: bool) -> String {
    let label_keys: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
    let image_note = if has_image {
        "A screenshot is attached. Judge the conversation it shows as well as any text below.\n"
    } else {
        ""
    };

    format!(
        r#"You are CareCloud, a safety reviewer that protects children and teenagers (ages 8-17).

Assume the person receiving this content is a minor. Intent matters more than
wording: polite language can still be dangerous. Grooming, manipulation,
secrecy, pressure or sexual undertones must always be flagged. When unsure,
protect the child.

Look for: insults, humiliation and bullying; emotional manipulation or
coercion; grooming or sexual intent; violence, gore and threats; hate speech;
encouragement of self-harm.

Scoring guide (0-100):
- Harmless: 0-20
- Mild insult: 40-55
- Profanity or humiliation: 60-70
- Manipulation or grooming: 75-90
- Sexual or violent threats: 90-100

Reply with ONE JSON object and nothing else, using exactly these keys:
  toxicity_score (integer 0-100),
  explanation (one or two sentences a parent can read),
  victim_support_message (kind words addressed to the child),
  safe_response_steps (array of short strings),
  detected_labels (object of booleans with keys: {labels})

{image_note}
CONTENT:
{text}
"#,
        labels = label_keys.join(", "),
    )
}

/// Instruction for transcribing a screenshot.
pub const OCR_PROMPT: &str = "Transcribe all readable text in this image exactly as written, \
one message per line, including sender names if visible. Reply with the text only. \
If there is no readable text, reply with an empty message.";
