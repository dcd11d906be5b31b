//! Streaming domain types.

use serde::Serialize;

/// One non-empty increment of generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GenerationFragment(String);

impl GenerationFragment {
    /// Wrap a text chunk, returning `None` for the empty string.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() { None } else { Some(Self(text)) }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.0
    }
}

/// A unit delivered to a streaming caller.
///
/// `Done` and `Error` are terminal: exactly one of them closes every stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(GenerationFragment),
    Done,
    Error(String),
}

impl StreamEvent {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }
}
