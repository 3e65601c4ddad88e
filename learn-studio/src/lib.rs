//! Template registry and generation orchestrator for learning artifacts.
//!
//! Depend on this crate to get the workspace crates behind feature flags.
//! Templates and validation layers are always available; the engine,
//! provider adapters, telemetry, and configuration can be switched off.

#![warn(missing_docs, clippy::pedantic)]

/// Shared primitives: techniques, versions, generation ids.
pub use learn_primitives as primitives;

/// Versioned templates and prompt rendering.
pub use learn_prompts as prompts;

/// Response parsing, schema validation, guardrails, and domain contracts.
pub use learn_guardrails as guardrails;

/// Generation orchestrator and typed learning flows (enabled by `engine` feature).
#[cfg(feature = "engine")]
pub use learn_engine as engine;

/// Completion clients (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use learn_adapters as adapters;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use learn_telemetry as telemetry;

/// Configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use learn_config as config;

/// Types most callers need.
#[cfg(feature = "engine")]
pub mod prelude {
    pub use learn_adapters::traits::CompletionClient;
    pub use learn_config::StudioConfig;
    pub use learn_engine::{
        GeneratedArtifact, GenerationError, GenerationOrchestrator, GenerationResult,
        LearningService,
    };
    pub use learn_primitives::{GenerationId, Technique, TemplateVersion};
    pub use learn_prompts::{TemplateMetadata, TemplateStore};
}
