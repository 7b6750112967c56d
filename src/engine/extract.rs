//! Pulls the JSON payload out of free-form generated text.

use serde_json::Value;

use crate::domain::GenerationError;

const EXCERPT_LEN: usize = 120;
const FENCE: &str = "```";

/// Return the first JSON array or object found in `text`.
///
/// The text is scanned from left to right. At each `[` or `{` the scanner
/// tries to read one complete JSON value; at each opening code fence it tries
/// the fenced body. Whichever parses first wins. Output that contains neither
/// is `Unparsable`.
pub fn extract_json(text: &str) -> Result<Value, GenerationError> {
    for (start, ch) in text.char_indices() {
        let candidate = match ch {
            '[' | '{' => leading_container(&text[start..]),
            '`' if text[start..].starts_with(FENCE) => fenced_body(&text[start..]).and_then(parse_container),
            _ => None,
        };
        if let Some(value) = candidate {
            return Ok(value);
        }
    }

    Err(GenerationError::Unparsable {
        excerpt: excerpt(text),
    })
}

/// A complete JSON array or object at the start of `text`, ignoring what follows.
fn leading_container(text: &str) -> Option<Value> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) if value.is_array() || value.is_object() => Some(value),
        _ => None,
    }
}

fn parse_container(body: &str) -> Option<Value> {
    serde_json::from_str::<Value>(body)
        .ok()
        .filter(|v| v.is_array() || v.is_object())
}

/// Body of the fenced block opening at the start of `text`, without the info
/// string after the opening fence.
fn fenced_body(text: &str) -> Option<&str> {
    let after_open = &text[FENCE.len()..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let close = body.find(FENCE)?;
    Some(body[..close].trim())
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
