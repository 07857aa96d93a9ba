//! Cleanup and decoding of model output.

use serde::{Deserialize, Deserializer};

/// Conflict verdict returned by the review model
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReviewVerdict {
    pub conflict_detected: bool,
    #[serde(deserialize_with = "null_as_empty")]
    pub clarification_question: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of the first fenced block between `open` and the next ```` ``` ````.
fn fenced_body<'a>(text: &'a str, open: &str) -> Option<&'a str> {
    let (_, rest) = text.split_once(open)?;
    let body = rest.split("```").next().unwrap_or(rest);
    Some(body.trim())
}

/// Strip a ```` ```json ```` fence, else the first bare fence, else just trim.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    fenced_body(text, "```json")
        .or_else(|| fenced_body(text, "```"))
        .unwrap_or(text)
}

/// Decode a review verdict, tolerating code fences around the JSON.
pub fn parse_review_verdict(raw: &str) -> Result<ReviewVerdict, serde_json::Error> {
    serde_json::from_str(strip_json_fences(raw))
}

/// Normalize a generated report.
///
/// A ```` ```markdown ```` block wins; otherwise every fence marker is removed.
pub fn clean_markdown_report(text: &str) -> String {
    let text = text.trim();
    if let Some(body) = fenced_body(text, "```markdown") {
        return body.to_string();
    }
    text.replace("```", "").trim().to_string()
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
