//! Chat engine port.
//!
//! This port defines the two ways the gateway invokes a text-generation
//! engine. It hides engine-specific response shapes behind plain text and
//! [`GenerationFragment`]s.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;
use thiserror::Error;

use crate::domain::{ChatRequest, GenerationFragment};

/// A lazy, single-pass sequence of generated fragments.
///
/// A midway failure is yielded as one final `Err` item; nothing follows it.
/// Dropping the stream cancels the generation.
pub type FragmentStream =
    Pin<Box<dyn Stream<Item = Result<GenerationFragment, EngineError>> + Send + 'static>>;

/// Errors produced by a generation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine answered with a non-success status.
    #[error("engine returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The engine did not answer in time.
    #[error("engine timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The engine's reply could not be decoded.
    #[error("failed to decode engine response: {0}")]
    Decode(String),

    /// The engine reported a failure while generating.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The fragment stream ended without the engine's completion marker.
    #[error("engine stream ended before generation completed")]
    Truncated,

    /// Unexpected internal condition.
    #[error("internal engine error: {0}")]
    Internal(String),
}

/// Port for invoking a text-generation engine.
///
/// Implementations must be safe to call from many tasks at once. If the
/// underlying engine cannot run generations concurrently, the implementation
/// serializes access itself; callers never coordinate.
#[async_trait]
pub trait ChatEngine: Send + Sync + fmt::Debug {
    /// Generate a complete reply in one shot.
    ///
    /// Unexpected reply shapes are not errors: the implementation returns the
    /// best available text, or the empty string.
    async fn complete_once(&self, request: &ChatRequest) -> Result<String, EngineError>;

    /// Start an incremental generation.
    ///
    /// An `Err` here means generation never started. Failures after the first
    /// fragment arrive through the stream.
    async fn complete_stream(&self, request: &ChatRequest) -> Result<FragmentStream, EngineError>;
}
