//! Compiled JSON-Schema (2020-12) validators memoized per template.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use jsonschema::Validator;
use learn_prompts::{Template, TemplateKey};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::{
    ContentViolation, Diagnostic, ValidationOutcome, ValidationStage, pointer_to_path,
};

/// Errors raised while compiling a response schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The template's response schema is not a valid 2020-12 schema.
    #[error("invalid response schema for {template}: {reason}")]
    Compile {
        /// `technique@version` of the offending template.
        template: String,
        /// Compiler message.
        reason: String,
    },
}

/// Cache of compiled response-schema validators keyed by `(technique, version)`.
///
/// Compilation happens outside the lock. Two callers racing on the same key
/// both compile and the last insert wins; both validators are equivalent.
#[derive(Default)]
pub struct SchemaCache {
    validators: RwLock<HashMap<TemplateKey, Arc<Validator>>>,
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("compiled", &self.len())
            .finish()
    }
}

impl SchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the validator for the template, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if the schema does not compile.
    pub fn validator_for(&self, template: &Template) -> Result<Arc<Validator>, SchemaError> {
        let key = template.key();
        if let Some(validator) = self
            .validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(validator));
        }

        let validator = jsonschema::draft202012::new(&template.response_schema).map_err(|err| {
            SchemaError::Compile {
                template: key.to_string(),
                reason: err.to_string(),
            }
        })?;
        let validator = Arc::new(validator);
        debug!(template = %key, "response schema compiled");

        self.validators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&validator));
        Ok(validator)
    }

    /// Validates `data` against the template schema.
    ///
    /// Returns one path-qualified diagnostic per violation in validator report
    /// order; an empty list means the data is valid.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if the schema does not compile.
    pub fn validate(&self, template: &Template, data: &Value) -> Result<Vec<Diagnostic>, SchemaError> {
        let validator = self.validator_for(template)?;
        Ok(validator
            .iter_errors(data)
            .map(|err| Diagnostic::new(pointer_to_path(&err.instance_path.to_string()), err.to_string()))
            .collect())
    }

    /// Validates `data` and folds the diagnostics into a schema-stage outcome.
    ///
    /// # Errors
    ///
    /// The outer error is a configuration problem; the inner `Err` is a
    /// retryable content violation.
    pub fn check(
        &self,
        template: &Template,
        data: &Value,
    ) -> Result<ValidationOutcome<()>, SchemaError> {
        let diagnostics = self.validate(template, data)?;
        if diagnostics.is_empty() {
            Ok(Ok(()))
        } else {
            Ok(Err(ContentViolation::new(ValidationStage::Schema, diagnostics)))
        }
    }

    /// Returns the number of compiled validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
