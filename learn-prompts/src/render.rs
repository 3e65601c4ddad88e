//! Deterministic prompt rendering.

use serde_json::{Map, Value};

use crate::template::Template;

const INPUT_HEADER: &str = "Input payload:";
const RESPONSE_DIRECTIVE: &str = "Respond strictly with JSON matching the provided response schema.";

/// Renders the oracle prompt for a template and an already validated input.
///
/// The input is serialized with object keys sorted at every depth, so equal
/// inputs always yield byte-identical prompts.
#[must_use]
pub fn render_prompt(template: &Template, input: &Value) -> String {
    let payload = canonicalize(input);
    [
        template.prompt.trim().to_owned(),
        INPUT_HEADER.to_owned(),
        format!("{payload:#}"),
        RESPONSE_DIRECTIVE.to_owned(),
    ]
    .join("\n\n")
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::TemplateStore;
    use learn_primitives::Technique;

    fn template() -> Template {
        TemplateStore::builtin()
            .unwrap()
            .get(Technique::Mnemonic, None)
            .unwrap()
    }

    #[test]
    fn prompt_has_instruction_payload_and_directive() {
        let template = template();
        let prompt = render_prompt(&template, &json!({ "term": "energia", "definition": "capacità di compiere lavoro" }));
        let sections: Vec<&str> = prompt.split("\n\n").collect();

        assert_eq!(sections[0], template.prompt.trim());
        assert_eq!(sections[1], INPUT_HEADER);
        assert!(prompt.contains("\"term\": \"energia\""));
        assert!(prompt.ends_with(RESPONSE_DIRECTIVE));
    }

    #[test]
    fn key_order_does_not_change_the_prompt() {
        let template = template();
        let a: Value = serde_json::from_str(r#"{"term":"x","definition":"y","extra":{"b":1,"a":2}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"extra":{"a":2,"b":1},"definition":"y","term":"x"}"#).unwrap();
        assert_eq!(render_prompt(&template, &a), render_prompt(&template, &b));
    }

    #[test]
    fn keys_are_sorted_in_output() {
        let prompt = render_prompt(&template(), &json!({ "term": "t", "definition": "d" }));
        let definition = prompt.find("\"definition\"").unwrap();
        let term = prompt.find("\"term\"").unwrap();
        assert!(definition < term);
    }
}
