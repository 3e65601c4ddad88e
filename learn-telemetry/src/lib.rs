//! Observability for the learning studio.
//!
//! Installs the global `tracing` subscriber: filter from `RUST_LOG`, output
//! format from `LEARN_LOG_FORMAT`.

#![warn(missing_docs, clippy::pedantic)]

pub mod subscriber;

pub use subscriber::{LOG_FORMAT_ENV, LogFormat, TelemetryConfig, TelemetryError, init_tracing};
