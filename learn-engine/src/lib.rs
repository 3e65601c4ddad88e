//! Generation engine for learning artifacts.
//!
//! [`GenerationOrchestrator`] resolves a template, checks caller input,
//! renders the prompt, and drives the completion client through a bounded
//! retry loop. Each candidate is parsed, schema-validated, guardrail-checked,
//! and domain-validated before its strings are trimmed and it is returned as a
//! [`GeneratedArtifact`]. [`LearningService`] layers typed flows on top.

#![warn(missing_docs, clippy::pedantic)]

mod artifact;
mod error;
mod input;
mod learning;
mod orchestrator;
mod spans;

pub use artifact::{GeneratedArtifact, trim_strings};
pub use error::{GenerationError, GenerationResult};
pub use input::InputContracts;
pub use learning::{
    CoachAdvice, CoachInput, CoachLevel, FlashcardDeck, FlashcardItem, FlashcardsInput,
    LearningArtifact, LearningService, MnemonicInput, StoryInput,
};
pub use orchestrator::{GenerationOrchestrator, MIN_MAX_TOKENS, token_budget};
pub use spans::{attempt_span, generation_span};
