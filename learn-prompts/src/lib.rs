//! Versioned prompt templates for learning-artifact generation.
//!
//! Templates are declarative JSON documents validated once at startup into an
//! immutable [`TemplateStore`]. Lookups hand out deep copies, and
//! [`render_prompt`] turns a template plus validated input into oracle text.

#![warn(missing_docs, clippy::pedantic)]

mod catalog;
mod error;
mod render;
mod store;
mod template;

pub use catalog::builtin_definitions;
pub use error::{TemplateError, TemplateResult};
pub use render::render_prompt;
pub use store::TemplateStore;
pub use template::{
    Guardrails, MAX_ALLOWED_ANSWER_LENGTH, Template, TemplateKey, TemplateMetadata,
};
