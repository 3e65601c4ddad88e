//! Business-rule checks layered above schema validation.

use learn_prompts::Guardrails;
use serde_json::Value;

use crate::diagnostics::{ContentViolation, Diagnostic, ValidationOutcome, ValidationStage};

/// Enforces template guardrails on a schema-valid response.
///
/// Checks run in order and stop at the first violation: the response must be
/// an object, must carry every `requiredFields` key (independently of what the
/// schema declares), and its compact serialization must fit in
/// `maxAnswerLength` characters.
///
/// Length counts Unicode scalar values, so an astral character such as an
/// emoji counts once rather than as two UTF-16 code units.
///
/// # Errors
///
/// Returns a [`ValidationStage::Guardrail`] violation naming the broken rule.
pub fn enforce_guardrails(guardrails: &Guardrails, response: &Value) -> ValidationOutcome<()> {
    let Some(payload) = response.as_object() else {
        return Err(violation(Diagnostic::root(
            "expected an object response",
        )));
    };

    if let Some(missing) = guardrails
        .required_fields
        .iter()
        .find(|field| !payload.contains_key(field.as_str()))
    {
        return Err(violation(Diagnostic::new(
            missing.as_str(),
            "missing required field (guardrails.requiredFields)",
        )));
    }

    let total_length = response.to_string().chars().count();
    let limit = guardrails.max_answer_length as usize;
    if total_length > limit {
        return Err(violation(Diagnostic::root(format!(
            "serialized response is {total_length} characters, exceeding guardrails.maxAnswerLength {limit}"
        ))));
    }

    Ok(())
}

fn violation(diagnostic: Diagnostic) -> ContentViolation {
    ContentViolation::single(ValidationStage::Guardrail, diagnostic)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn guardrails(max_answer_length: u32) -> Guardrails {
        Guardrails {
            max_answer_length,
            required_fields: vec!["mnemonic".into(), "keywords".into()],
        }
    }

    #[test]
    fn compliant_response_passes() {
        let response = json!({ "mnemonic": "ONDA", "keywords": ["onda"] });
        assert!(enforce_guardrails(&guardrails(200), &response).is_ok());
    }

    #[test]
    fn non_object_responses_fail() {
        for response in [Value::Null, json!([1]), json!("text")] {
            let err = enforce_guardrails(&guardrails(200), &response).expect_err("not an object");
            assert_eq!(err.stage(), ValidationStage::Guardrail);
            assert!(err.summary().contains("expected an object response"));
        }
    }

    #[test]
    fn missing_required_field_is_named() {
        let response = json!({ "mnemonic": "ONDA" });
        let err = enforce_guardrails(&guardrails(200), &response).expect_err("missing");
        assert_eq!(err.diagnostics()[0].path(), "keywords");
        assert!(err.summary().contains("guardrails.requiredFields"));
    }

    #[test]
    fn total_length_is_measured_on_compact_json() {
        let response = json!({ "mnemonic": "ONDA", "keywords": ["onda"] });
        let exact = u32::try_from(response.to_string().chars().count()).unwrap();
        assert!(enforce_guardrails(&guardrails(exact), &response).is_ok());

        let err = enforce_guardrails(&guardrails(exact - 1), &response).expect_err("too long");
        assert!(err.summary().contains("guardrails.maxAnswerLength"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let response = json!({ "mnemonic": "àèìòù", "keywords": ["é"] });
        let chars = u32::try_from(response.to_string().chars().count()).unwrap();
        assert!(response.to_string().len() > chars as usize);
        assert!(enforce_guardrails(&guardrails(chars), &response).is_ok());
    }

    #[test]
    fn astral_characters_count_once() {
        let response = json!({ "mnemonic": "🌊", "keywords": ["onda"] });
        let scalars = u32::try_from(response.to_string().chars().count()).unwrap();
        let utf16 = response.to_string().encode_utf16().count();
        assert_eq!(utf16, scalars as usize + 1);
        assert!(enforce_guardrails(&guardrails(scalars), &response).is_ok());
    }
}
