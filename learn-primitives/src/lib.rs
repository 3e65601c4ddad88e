//! Core shared types for the learning studio generation pipeline.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod technique;
mod version;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Unique identifier attached to every generation run.
pub use ids::GenerationId;
/// Supported generation flows and their locale.
pub use technique::{Language, Technique};
/// Semantic version strings with numeric ordering.
pub use version::TemplateVersion;
