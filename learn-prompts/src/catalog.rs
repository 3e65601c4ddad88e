//! Built-in template catalog embedded at compile time.

use serde_json::Value;

use crate::error::{TemplateError, TemplateResult};
use crate::store::TemplateStore;

const BUILTIN_DEFINITIONS: [(&str, &str); 4] = [
    (
        "mnemonic_it/v1.json",
        include_str!("../templates/mnemonic_it/v1.json"),
    ),
    ("story_it/v1.json", include_str!("../templates/story_it/v1.json")),
    (
        "flashcards_index_it/v1.json",
        include_str!("../templates/flashcards_index_it/v1.json"),
    ),
    ("coach_it/v1.json", include_str!("../templates/coach_it/v1.json")),
];

/// Parses the embedded template documents.
///
/// # Errors
///
/// Returns [`TemplateError::Configuration`] if an embedded document is not JSON.
pub fn builtin_definitions() -> TemplateResult<Vec<Value>> {
    BUILTIN_DEFINITIONS
        .iter()
        .map(|(path, source)| {
            serde_json::from_str(source)
                .map_err(|err| TemplateError::configuration(*path, format!("invalid JSON: {err}")))
        })
        .collect()
}

impl TemplateStore {
    /// Builds a store from the embedded catalog.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Configuration`] if any embedded template fails
    /// validation.
    pub fn builtin() -> TemplateResult<Self> {
        Self::register(builtin_definitions()?)
    }
}

#[cfg(test)]
mod tests {
    use learn_primitives::{Language, Technique};

    use super::*;
    use crate::template::MAX_ALLOWED_ANSWER_LENGTH;

    #[test]
    fn every_technique_has_a_valid_builtin_template() {
        let store = TemplateStore::builtin().expect("builtin catalog");
        for technique in Technique::ALL {
            let template = store.get(technique, None).expect("registered");
            assert_eq!(template.version.as_str(), "1.0.0");
            assert_eq!(template.language, Language::Italian);
            assert!(template.guardrails.max_answer_length <= MAX_ALLOWED_ANSWER_LENGTH);

            let required = template.response_schema["required"].as_array().unwrap();
            for field in &template.guardrails.required_fields {
                assert!(required.iter().any(|r| r == field.as_str()));
                assert!(template.response_schema["properties"].get(field).is_some());
            }
        }
    }

    #[test]
    fn flashcards_template_is_addressable_by_version() {
        let store = TemplateStore::builtin().unwrap();
        let template = store.get(Technique::FlashcardsIndex, Some("1.0.0")).unwrap();
        assert_eq!(template.input_fields, ["topic", "items"]);
    }

    #[test]
    fn listing_covers_every_technique() {
        let listed: Vec<Technique> = TemplateStore::builtin()
            .unwrap()
            .list()
            .into_iter()
            .map(|meta| meta.technique)
            .collect();
        assert_eq!(listed, Technique::ALL);
    }
}
