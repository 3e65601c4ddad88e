//! Shared error definitions for learning primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the learning studio.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided generation identifier could not be parsed.
    #[error("invalid generation id: {source}")]
    InvalidGenerationId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Technique identifier is not one of the supported flows.
    #[error("unknown technique `{id}`")]
    UnknownTechnique {
        /// The offending identifier string.
        id: String,
    },

    /// Language code is not supported.
    #[error("unsupported language `{code}`")]
    UnsupportedLanguage {
        /// The offending language code.
        code: String,
    },

    /// Version string failed validation.
    #[error("invalid version `{version}`: {reason}")]
    InvalidVersion {
        /// The offending version string.
        version: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
