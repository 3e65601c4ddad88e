//! Tolerant extraction of JSON from raw oracle text.

use serde_json::Value;

use crate::diagnostics::{ContentViolation, Diagnostic, ValidationOutcome, ValidationStage};

/// Extracts a JSON value from an untrusted completion.
///
/// The trimmed text is parsed directly first. Failing that, the span from the
/// first `{` to the last `}` is parsed, which recovers objects wrapped in prose
/// or code fences.
///
/// # Errors
///
/// Returns a [`ValidationStage::Parse`] violation when neither attempt yields JSON.
pub fn parse_response(raw: &str) -> ValidationOutcome<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(ContentViolation::single(
        ValidationStage::Parse,
        Diagnostic::root("unparseable response"),
    ))
}
