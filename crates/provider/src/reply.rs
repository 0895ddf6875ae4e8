use serde_json::Value;

use crate::{ProviderError, ProviderReply};

/// Parses the model's message content. Models often wrap JSON in a Markdown
/// fence even when told not to, so a surrounding fence is stripped first.
pub fn parse_reply_content(content: &str) -> Result<ProviderReply, ProviderError> {
    let body = strip_code_fence(content);
    match serde_json::from_str::<Value>(body).map_err(ProviderError::InvalidJson)? {
        Value::Object(map) => Ok(map),
        _ => Err(ProviderError::NotAnObject),
    }
}

pub(crate) fn extract_message_content(payload: &Value) -> Option<String> {
    payload
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(ToString::to_string)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json"), which may share the line with the body.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
