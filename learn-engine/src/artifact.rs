//! Accepted generation output.

use learn_primitives::{GenerationId, Technique, TemplateVersion};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenerationError, GenerationResult};

/// Validated, post-processed payload of a successful generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    /// Identifier shared with the generation's tracing span.
    pub id: GenerationId,
    /// Technique that produced the payload.
    pub technique: Technique,
    /// Template version used.
    pub version: TemplateVersion,
    /// Attempt (1-based) whose candidate was accepted.
    pub attempts: u32,
    /// Payload with every string leaf trimmed.
    pub payload: Value,
}

impl GeneratedArtifact {
    /// Decodes the payload into a typed result.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Configuration`] when the payload does not
    /// match `T`, which means the technique's domain contract is too lax.
    pub fn decode<T: DeserializeOwned>(&self) -> GenerationResult<T> {
        T::deserialize(&self.payload).map_err(|err| {
            GenerationError::configuration(format!(
                "{} payload accepted but not decodable: {err}",
                self.technique
            ))
        })
    }
}

/// Trims leading and trailing whitespace from every string leaf, in place.
///
/// Object keys are left untouched.
pub fn trim_strings(value: &mut Value) {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.len() != text.len() {
                *text = trimmed.to_owned();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(trim_strings),
        Value::Object(fields) => fields.values_mut().for_each(trim_strings),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
