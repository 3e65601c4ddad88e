//! Configuration management for the learning studio.
//!
//! Values come from defaults, then an optional JSON document, then
//! `LEARN_*` environment variables, each layer overriding the previous one.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{CONFIG_PATH_ENV, ConfigError, ConfigResult};
pub use schema::{AttemptBudgets, OracleSettings, StudioConfig};
