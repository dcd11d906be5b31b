//! Chat domain types.
//!
//! A [`ChatRequest`] can only be obtained through validation, so any value of
//! that type already satisfies the request invariants: at least one turn, a
//! positive token bound and a finite temperature.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

/// Token bound used when the caller does not supply `max_tokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 256;

pub(crate) const DEFAULT_MAX_TOKENS_NONZERO: NonZeroU32 =
    match NonZeroU32::new(DEFAULT_MAX_TOKENS) {
        Some(n) => n,
        None => panic!("DEFAULT_MAX_TOKENS must be positive"),
    };

/// Sampling temperature used when the caller does not supply one.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Upper bound accepted for `temperature`.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Maximum number of stop sequences per request.
pub const MAX_STOP_SEQUENCES: usize = 8;

/// The role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl TurnRole {
    /// Parse a role from its wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Convert role to its wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One role-tagged message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: TurnRole,
    content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    #[must_use]
    pub const fn role(&self) -> TurnRole {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A validated chat request.
///
/// Serializes to the same wire shape the gateway accepts
/// (`messages`, `max_tokens`, `temperature`, `stop`), which is also the shape
/// the engine's chat endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    #[serde(rename = "messages")]
    turns: Vec<ConversationTurn>,
    max_tokens: NonZeroU32,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

impl ChatRequest {
    /// Build a request with default generation parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `turns` is empty.
    pub fn new(turns: Vec<ConversationTurn>) -> Result<Self, ValidationError> {
        if turns.is_empty() {
            return Err(ValidationError::single(
                "messages",
                validation::EMPTY_TURNS_MESSAGE,
            ));
        }
        Ok(Self::from_parts(
            turns,
            DEFAULT_MAX_TOKENS_NONZERO,
            DEFAULT_TEMPERATURE,
            Vec::new(),
        ))
    }

    /// Assemble a request from already-checked parts.
    pub(crate) fn from_parts(
        turns: Vec<ConversationTurn>,
        max_tokens: NonZeroU32,
        temperature: f32,
        stop: Vec<String>,
    ) -> Self {
        Self {
            turns,
            max_tokens,
            temperature,
            stop,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: NonZeroU32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Replace the sampling temperature.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the value is not finite or outside
    /// `0.0..=2.0`.
    pub fn with_temperature(mut self, temperature: f32) -> Result<Self, ValidationError> {
        validation::check_temperature(f64::from(temperature))
            .map_err(|message| ValidationError::single("temperature", message))?;
        self.temperature = temperature;
        Ok(self)
    }

    /// Replace the stop sequences.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if there are too many sequences or one is empty.
    pub fn with_stop<I, S>(mut self, stop: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stop: Vec<String> = stop.into_iter().map(Into::into).collect();
        validation::check_stop(&stop).map_err(ValidationError::from_issues)?;
        self.stop = stop;
        Ok(self)
    }

    /// Turns in chronological order.
    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub const fn max_tokens(&self) -> u32 {
        self.max_tokens.get()
    }

    #[must_use]
    pub const fn temperature(&self) -> f32 {
        self.temperature
    }

    #[must_use]
    pub fn stop(&self) -> &[String] {
        &self.stop
    }
}

/// The completed reply to a non-streaming chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    id: String,
    role: TurnRole,
    content: String,
}

impl ChatResponse {
    /// Wrap generated text as an assistant reply.
    #[must_use]
    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn role(&self) -> TurnRole {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}
