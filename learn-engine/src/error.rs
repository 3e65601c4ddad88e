//! Errors surfaced by [`crate::GenerationOrchestrator::generate`].

use learn_adapters::traits::AdapterError;
use learn_guardrails::{Diagnostic, SchemaError, ValidationStage, join_diagnostics};
use learn_primitives::Technique;
use learn_prompts::TemplateError;
use thiserror::Error;

/// Result alias for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Why a generation request produced no artifact.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No template for the technique, or not at the requested version.
    #[error(transparent)]
    NotFound(TemplateError),

    /// Caller input violates the technique's input contract. Never retried.
    #[error("invalid input for {technique}: {}", join_diagnostics(.diagnostics))]
    InvalidInput {
        /// Requested technique.
        technique: Technique,
        /// Path-qualified violations in report order.
        diagnostics: Vec<Diagnostic>,
    },

    /// Every attempt produced content that failed validation.
    #[error(
        "unprocessable content for {technique} after {attempts} attempt(s), {stage} failed: {}",
        join_diagnostics(.diagnostics)
    )]
    UnprocessableContent {
        /// Requested technique.
        technique: Technique,
        /// Attempts consumed; equals the technique's budget.
        attempts: u32,
        /// Stage that rejected the last attempt.
        stage: ValidationStage,
        /// Diagnostics of the last attempt.
        diagnostics: Vec<Diagnostic>,
    },

    /// The completion capability failed. Never retried.
    #[error("completion call failed: {0}")]
    Oracle(#[from] AdapterError),

    /// A template or schema is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GenerationError {
    /// Convenience constructor for configuration errors.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Returns the diagnostics carried by input or content failures.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::InvalidInput { diagnostics, .. }
            | Self::UnprocessableContent { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<TemplateError> for GenerationError {
    fn from(err: TemplateError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err)
        } else {
            Self::Configuration(err.to_string())
        }
    }
}

impl From<SchemaError> for GenerationError {
    fn from(err: SchemaError) -> Self {
        Self::Configuration(err.to_string())
    }
}
