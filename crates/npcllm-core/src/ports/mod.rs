//! Port definitions (trait abstractions) for external collaborators.
//!
//! The gateway only talks to the generation engine through [`ChatEngine`].
//! Concrete implementations live in `npcllm-runtime`; tests substitute stubs.

mod engine;

pub use engine::{ChatEngine, EngineError, FragmentStream};
