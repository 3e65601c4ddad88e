//! Error types for template loading and lookup.

use learn_primitives::Technique;
use thiserror::Error;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised by the template store.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A template definition is malformed or inconsistent. Fatal at startup.
    #[error("invalid template {template}: {reason}")]
    Configuration {
        /// `technique@version` label, best effort for unparseable documents.
        template: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// No template is registered for the technique.
    #[error("unknown technique: {technique}")]
    UnknownTechnique {
        /// Requested technique.
        technique: Technique,
    },

    /// The technique exists but not at the requested version.
    #[error("unknown version {version} for technique {technique}")]
    UnknownVersion {
        /// Requested technique.
        technique: Technique,
        /// Requested version string.
        version: String,
    },
}

impl TemplateError {
    /// Convenience constructor for configuration errors.
    #[must_use]
    pub fn configuration(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for lookup misses (unknown technique or version).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownTechnique { .. } | Self::UnknownVersion { .. }
        )
    }
}
