//! Text extraction from engine replies.
//!
//! Engines nest generated text differently depending on the reply variant
//! (`message` for completions, `delta` for stream chunks, a bare `text` or
//! `output` field for older endpoints). These routines reduce every shape to
//! plain text and never fail.

use serde_json::Value;

/// Extract the generated text from a non-streaming reply.
///
/// Fallback order:
/// 1. every `choices[i].message.content`, else `choices[i].delta.content`,
///    joined in order (empty strings skipped)
/// 2. top-level `text`
/// 3. top-level `output`
/// 4. the empty string
#[must_use]
pub fn completion_text(reply: &Value) -> String {
    let parts: Vec<&str> = reply
        .get("choices")
        .and_then(Value::as_array)
        .map(|choices| choices.iter().filter_map(choice_text).collect())
        .unwrap_or_default();

    if !parts.is_empty() {
        return parts.concat();
    }

    ["text", "output"]
        .iter()
        .find_map(|key| non_empty_str(reply.get(*key)))
        .unwrap_or_default()
        .to_owned()
}

/// Extract the incremental text from one streaming chunk.
///
/// Reads `choices[0].delta.content`, falling back to
/// `choices[0].message.content` and then a top-level `content`. Returns
/// `None` when the chunk carries no text (role-only or finish chunks).
#[must_use]
pub fn delta_text(chunk: &Value) -> Option<&str> {
    chunk
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| {
            non_empty_str(choice.get("delta").and_then(|d| d.get("content")))
                .or_else(|| non_empty_str(choice.get("message").and_then(|m| m.get("content"))))
        })
        .or_else(|| non_empty_str(chunk.get("content")))
}

/// Extract an error description from a reply, if it carries one.
///
/// Handles both `{"error": "text"}` and `{"error": {"message": "text"}}`.
#[must_use]
pub fn error_message(reply: &Value) -> Option<String> {
    match reply.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .map_or_else(|| Value::Object(obj.clone()).to_string(), str::to_owned),
        ),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn choice_text(choice: &Value) -> Option<&str> {
    non_empty_str(choice.get("message").and_then(|m| m.get("content")))
        .or_else(|| non_empty_str(choice.get("delta").and_then(|d| d.get("content"))))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
