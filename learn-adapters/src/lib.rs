//! Completion clients used by the generation engine.
//!
//! The engine depends only on the [`traits::CompletionClient`] seam; concrete
//! providers and test doubles live in sibling modules.

#![warn(missing_docs, clippy::pedantic)]

pub mod openai;
pub mod scripted;
pub mod traits;

mod http_client;
