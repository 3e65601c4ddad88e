//! Template model and load-time validation of declarative definitions.

use std::fmt;

use learn_primitives::{Language, Technique, TemplateVersion};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TemplateError, TemplateResult};

/// Upper bound accepted for `guardrails.maxAnswerLength`.
pub const MAX_ALLOWED_ANSWER_LENGTH: u32 = 1200;

const MIN_PROMPT_CHARS: usize = 10;

/// Business-rule limits enforced on top of the response schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardrails {
    /// Maximum character count of the serialized response.
    pub max_answer_length: u32,
    /// Top-level keys the response must carry.
    pub required_fields: Vec<String>,
}

/// A validated, versioned prompt template for one technique.
///
/// Fields are public plain data: the store hands out deep copies, so changing a
/// returned template never reaches the registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Technique this template drives.
    pub technique: Technique,
    /// Declared version.
    pub version: TemplateVersion,
    /// Locale of the prompt and expected output.
    pub language: Language,
    /// Instruction text sent ahead of the input payload.
    pub prompt: String,
    /// Input fields the caller must supply, in declaration order.
    pub input_fields: Vec<String>,
    /// Guardrails applied after schema validation.
    pub guardrails: Guardrails,
    /// JSON-Schema (2020-12) the oracle response must satisfy.
    pub response_schema: Value,
}

impl Template {
    /// Validates a declarative template document.
    ///
    /// Shape is checked first (fields present and typed, supported locale,
    /// bounded guardrails), then every guardrail field must be declared in both
    /// `responseSchema.required` and `responseSchema.properties`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Configuration`] describing the first violation.
    pub fn from_definition(definition: Value) -> TemplateResult<Self> {
        let label = definition_label(&definition);
        let raw: RawTemplate = serde_json::from_value(definition)
            .map_err(|err| TemplateError::configuration(&label, err.to_string()))?;
        let template = raw.validate(&label)?;
        template.check_guardrail_consistency()?;
        Ok(template)
    }

    /// Returns the `(technique, version)` key identifying this template.
    #[must_use]
    pub fn key(&self) -> TemplateKey {
        TemplateKey {
            technique: self.technique,
            version: self.version.clone(),
        }
    }

    /// Returns the metadata view exposed to listing callers.
    #[must_use]
    pub fn metadata(&self) -> TemplateMetadata {
        TemplateMetadata {
            technique: self.technique,
            version: self.version.clone(),
            language: self.language,
            prompt: self.prompt.clone(),
            input_fields: self.input_fields.clone(),
            guardrails: self.guardrails.clone(),
        }
    }

    fn check_guardrail_consistency(&self) -> TemplateResult<()> {
        let required: Vec<&str> = self
            .response_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let properties = self
            .response_schema
            .get("properties")
            .and_then(Value::as_object);

        for field in &self.guardrails.required_fields {
            if !required.contains(&field.as_str()) {
                return Err(TemplateError::configuration(
                    self.key().to_string(),
                    format!("missing required field \"{field}\" in responseSchema.required"),
                ));
            }
            if !properties.is_some_and(|props| props.contains_key(field)) {
                return Err(TemplateError::configuration(
                    self.key().to_string(),
                    format!("missing property definition for \"{field}\""),
                ));
            }
        }
        Ok(())
    }
}

/// Identifies one registered template.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateKey {
    /// Technique component.
    pub technique: Technique,
    /// Version component.
    pub version: TemplateVersion,
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.technique, self.version)
    }
}

/// Template fields safe to expose to listing callers (no response schema).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Technique identifier.
    pub technique: Technique,
    /// Template version.
    pub version: TemplateVersion,
    /// Template locale.
    pub language: Language,
    /// Instruction text.
    pub prompt: String,
    /// Declared input fields.
    pub input_fields: Vec<String>,
    /// Guardrail limits.
    pub guardrails: Guardrails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTemplate {
    technique: String,
    version: String,
    language: String,
    prompt: String,
    input_fields: Vec<String>,
    guardrails: RawGuardrails,
    response_schema: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGuardrails {
    max_answer_length: i64,
    required_fields: Vec<String>,
}

impl RawTemplate {
    fn validate(self, label: &str) -> TemplateResult<Template> {
        let fail = |reason: String| TemplateError::configuration(label, reason);

        let technique = self
            .technique
            .parse::<Technique>()
            .map_err(|err| fail(err.to_string()))?;
        let version = TemplateVersion::parse(self.version).map_err(|err| fail(err.to_string()))?;
        let language = self
            .language
            .parse::<Language>()
            .map_err(|err| fail(err.to_string()))?;

        if self.prompt.trim().chars().count() < MIN_PROMPT_CHARS {
            return Err(fail(format!(
                "prompt must be at least {MIN_PROMPT_CHARS} characters"
            )));
        }
        check_names("inputFields", &self.input_fields).map_err(fail)?;
        check_names("guardrails.requiredFields", &self.guardrails.required_fields).map_err(fail)?;

        let max_answer_length = u32::try_from(self.guardrails.max_answer_length)
            .ok()
            .filter(|len| (1..=MAX_ALLOWED_ANSWER_LENGTH).contains(len))
            .ok_or_else(|| {
                fail(format!(
                    "guardrails.maxAnswerLength must be in [1, {MAX_ALLOWED_ANSWER_LENGTH}], got {}",
                    self.guardrails.max_answer_length
                ))
            })?;

        if !self.response_schema.is_object() {
            return Err(fail("responseSchema must be an object".into()));
        }

        Ok(Template {
            technique,
            version,
            language,
            prompt: self.prompt,
            input_fields: self.input_fields,
            guardrails: Guardrails {
                max_answer_length,
                required_fields: self.guardrails.required_fields,
            },
            response_schema: self.response_schema,
        })
    }
}

fn check_names(field: &str, names: &[String]) -> Result<(), String> {
    if names.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(format!("{field} entries must be non-empty strings"));
    }
    Ok(())
}

fn definition_label(definition: &Value) -> String {
    let part = |key: &str| {
        definition
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_owned()
    };
    format!("{}@{}", part("technique"), part("version"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn definition(technique: &str, version: &str) -> Value {
        json!({
            "technique": technique,
            "version": version,
            "language": "it",
            "prompt": "Crea un mnemonico per il termine indicato.",
            "inputFields": ["term", "definition"],
            "guardrails": { "maxAnswerLength": 400, "requiredFields": ["mnemonic"] },
            "responseSchema": {
                "type": "object",
                "properties": { "mnemonic": { "type": "string" } },
                "required": ["mnemonic"]
            }
        })
    }

    fn reason(err: TemplateError) -> String {
        match err {
            TemplateError::Configuration { reason, .. } => reason,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_consistent_definition() {
        let template = Template::from_definition(definition("mnemonic_it", "1.0.0")).unwrap();
        assert_eq!(template.technique, Technique::Mnemonic);
        assert_eq!(template.guardrails.max_answer_length, 400);
        assert_eq!(template.key().to_string(), "mnemonic_it@1.0.0");
    }

    #[test]
    fn rejects_unsupported_language() {
        let mut doc = definition("mnemonic_it", "1.0.0");
        doc["language"] = json!("en");
        let err = Template::from_definition(doc).expect_err("language");
        assert!(reason(err).contains("unsupported language"));
    }

    #[test]
    fn rejects_out_of_range_answer_length() {
        for bad in [0, -3, 1201] {
            let mut doc = definition("mnemonic_it", "1.0.0");
            doc["guardrails"]["maxAnswerLength"] = json!(bad);
            let err = Template::from_definition(doc).expect_err("length");
            assert!(reason(err).contains("maxAnswerLength"));
        }
    }

    #[test]
    fn rejects_empty_field_lists() {
        let mut doc = definition("mnemonic_it", "1.0.0");
        doc["inputFields"] = json!([]);
        assert!(reason(Template::from_definition(doc).unwrap_err()).contains("inputFields"));

        let mut doc = definition("mnemonic_it", "1.0.0");
        doc["guardrails"]["requiredFields"] = json!([]);
        assert!(reason(Template::from_definition(doc).unwrap_err()).contains("requiredFields"));
    }

    #[test]
    fn rejects_missing_or_mistyped_fields() {
        let mut doc = definition("mnemonic_it", "1.0.0");
        doc.as_object_mut().unwrap().remove("prompt");
        assert!(Template::from_definition(doc).is_err());

        let mut doc = definition("mnemonic_it", "1.0.0");
        doc["responseSchema"] = json!("not a schema");
        assert!(reason(Template::from_definition(doc).unwrap_err()).contains("responseSchema"));
    }

    #[test]
    fn guardrail_field_must_be_schema_required() {
        let mut doc = definition("mnemonic_it", "1.0.0");
        doc["guardrails"]["requiredFields"] = json!(["mnemonic", "keywords"]);
        let err = Template::from_definition(doc).expect_err("not required");
        let message = err.to_string();
        assert!(message.contains("mnemonic_it@1.0.0"));
        assert!(message.contains("responseSchema.required"));
    }

    #[test]
    fn guardrail_field_must_have_property() {
        let mut doc = definition("mnemonic_it", "1.0.0");
        doc["responseSchema"]["required"] = json!(["mnemonic", "keywords"]);
        doc["guardrails"]["requiredFields"] = json!(["keywords"]);
        let err = Template::from_definition(doc).expect_err("no property");
        assert!(reason(err).contains("property definition for \"keywords\""));
    }

    #[test]
    fn metadata_omits_schema() {
        let template = Template::from_definition(definition("story_it", "2.0.0")).unwrap();
        let encoded = serde_json::to_value(template.metadata()).unwrap();
        assert!(encoded.get("responseSchema").is_none());
        assert_eq!(encoded["inputFields"], json!(["term", "definition"]));
        assert_eq!(encoded["guardrails"]["maxAnswerLength"], json!(400));
    }
}
