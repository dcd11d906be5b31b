//! Chat request validation.
//!
//! Turns an untrusted JSON body into a [`ChatRequest`]. Validation fails
//! closed: every problem found is reported at once, and nothing is accepted
//! unless the whole request is valid.

use std::num::NonZeroU32;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::chat::DEFAULT_MAX_TOKENS_NONZERO;
use crate::domain::{
    ChatRequest, ConversationTurn, DEFAULT_TEMPERATURE, MAX_STOP_SEQUENCES, MAX_TEMPERATURE,
    TurnRole,
};

pub(crate) const EMPTY_TURNS_MESSAGE: &str = "must contain at least one turn";

/// One problem found in a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    field: String,
    message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// JSON path of the offending field, e.g. `messages[2].role`.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Aggregate validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body is not JSON at all.
    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    /// The body is JSON but violates the request schema.
    #[error("Invalid chat request: {}", join_issues(.0))]
    Invalid(Vec<ValidationIssue>),
}

impl ValidationError {
    pub(crate) fn single(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid(vec![ValidationIssue::new(field, message)])
    }

    pub(crate) const fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self::Invalid(issues)
    }

    /// The individual issues; empty for [`ValidationError::MalformedBody`].
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::MalformedBody(_) => &[],
            Self::Invalid(issues) => issues,
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse and validate a raw request body.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedBody`] if the bytes are not JSON, and
/// [`ValidationError::Invalid`] if the JSON does not describe a valid request.
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, ValidationError> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
    validate_chat_request(&raw)
}

/// Validate a decoded request body and fill in defaults.
///
/// Unknown fields (e.g. `model`, `stream`) are ignored. `null` is treated the
/// same as an absent optional field.
///
/// # Errors
///
/// Returns [`ValidationError::Invalid`] listing every problem found.
pub fn validate_chat_request(raw: &Value) -> Result<ChatRequest, ValidationError> {
    let Some(obj) = raw.as_object() else {
        return Err(ValidationError::single("$", "expected a JSON object"));
    };

    let mut issues = Vec::new();

    let turns = validate_turns(obj, &mut issues);
    let max_tokens = validate_max_tokens(obj.get("max_tokens"), &mut issues);
    let temperature = validate_temperature(obj.get("temperature"), &mut issues);
    let stop = validate_stop(obj.get("stop"), &mut issues);

    if !issues.is_empty() {
        return Err(ValidationError::Invalid(issues));
    }

    Ok(ChatRequest::from_parts(turns, max_tokens, temperature, stop))
}

fn validate_turns(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> Vec<ConversationTurn> {
    let messages = match obj.get("messages") {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new("messages", "field is required"));
            return Vec::new();
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            issues.push(ValidationIssue::new("messages", "must be an array"));
            return Vec::new();
        }
    };

    if messages.is_empty() {
        issues.push(ValidationIssue::new("messages", EMPTY_TURNS_MESSAGE));
        return Vec::new();
    }

    messages
        .iter()
        .enumerate()
        .filter_map(|(i, item)| validate_turn(i, item, issues))
        .collect()
}

fn validate_turn(
    index: usize,
    item: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<ConversationTurn> {
    let Some(turn) = item.as_object() else {
        issues.push(ValidationIssue::new(
            format!("messages[{index}]"),
            "must be an object",
        ));
        return None;
    };

    let role = match turn.get("role") {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new(
                format!("messages[{index}].role"),
                "field is required",
            ));
            None
        }
        Some(Value::String(name)) => {
            let parsed = TurnRole::parse(name);
            if parsed.is_none() {
                issues.push(ValidationIssue::new(
                    format!("messages[{index}].role"),
                    format!("unrecognized role `{name}` (expected system, user, or assistant)"),
                ));
            }
            parsed
        }
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("messages[{index}].role"),
                "must be a string",
            ));
            None
        }
    };

    let content = match turn.get("content") {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new(
                format!("messages[{index}].content"),
                "field is required",
            ));
            None
        }
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new(
                format!("messages[{index}].content"),
                "must be a string",
            ));
            None
        }
    };

    Some(ConversationTurn::new(role?, content?))
}

fn validate_max_tokens(value: Option<&Value>, issues: &mut Vec<ValidationIssue>) -> NonZeroU32 {
    let default = DEFAULT_MAX_TOKENS_NONZERO;
    match value {
        None | Some(Value::Null) => default,
        Some(v) => match v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .and_then(NonZeroU32::new)
        {
            Some(n) => n,
            None => {
                issues.push(ValidationIssue::new(
                    "max_tokens",
                    format!("must be a positive integer no greater than {}", u32::MAX),
                ));
                default
            }
        },
    }
}

fn validate_temperature(value: Option<&Value>, issues: &mut Vec<ValidationIssue>) -> f32 {
    match value {
        None | Some(Value::Null) => DEFAULT_TEMPERATURE,
        Some(v) => {
            let Some(t) = v.as_f64() else {
                issues.push(ValidationIssue::new("temperature", "must be a number"));
                return DEFAULT_TEMPERATURE;
            };
            match check_temperature(t) {
                #[allow(clippy::cast_possible_truncation)]
                Ok(()) => t as f32,
                Err(message) => {
                    issues.push(ValidationIssue::new("temperature", message));
                    DEFAULT_TEMPERATURE
                }
            }
        }
    }
}

fn validate_stop(value: Option<&Value>, issues: &mut Vec<ValidationIssue>) -> Vec<String> {
    let stop = match value {
        None | Some(Value::Null) => return Vec::new(),
        // A single string is shorthand for a one-element list.
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) if items.is_empty() => {
            issues.push(ValidationIssue::new(
                "stop",
                "must contain at least one stop sequence",
            ));
            return Vec::new();
        }
        Some(Value::Array(items)) => {
            let mut stop = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(s) => stop.push(s.to_owned()),
                    None => issues.push(ValidationIssue::new(
                        format!("stop[{i}]"),
                        "must be a string",
                    )),
                }
            }
            stop
        }
        Some(_) => {
            issues.push(ValidationIssue::new(
                "stop",
                "must be a string or an array of strings",
            ));
            return Vec::new();
        }
    };

    if let Err(found) = check_stop(&stop) {
        issues.extend(found);
    }
    stop
}

/// Check a temperature value, returning the issue message on failure.
pub(crate) fn check_temperature(t: f64) -> Result<(), String> {
    if !t.is_finite() {
        return Err("must be a finite number".to_owned());
    }
    if !(0.0..=f64::from(MAX_TEMPERATURE)).contains(&t) {
        return Err(format!("must be between 0.0 and {MAX_TEMPERATURE}"));
    }
    Ok(())
}

/// Check a list of stop sequences.
pub(crate) fn check_stop(stop: &[String]) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if stop.len() > MAX_STOP_SEQUENCES {
        issues.push(ValidationIssue::new(
            "stop",
            format!("at most {MAX_STOP_SEQUENCES} stop sequences are allowed"),
        ));
    }
    for (i, s) in stop.iter().enumerate() {
        if s.is_empty() {
            issues.push(ValidationIssue::new(format!("stop[{i}]"), "must not be empty"));
        }
    }
    if issues.is_empty() { Ok(()) } else { Err(issues) }
}
