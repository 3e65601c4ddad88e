//! Spans every generation runs inside.

use learn_primitives::{GenerationId, Technique};
use tracing::Span;

/// Span covering one `generate` call.
///
/// `version` and `attempts` are declared empty and recorded once the template
/// is resolved and the loop finishes.
#[must_use]
pub fn generation_span(id: GenerationId, technique: Technique) -> Span {
    tracing::info_span!(
        "generation",
        generation_id = %id,
        technique = %technique,
        version = tracing::field::Empty,
        attempts = tracing::field::Empty,
    )
}

/// Span covering a single render-call-validate cycle.
#[must_use]
pub fn attempt_span(attempt: u32, budget: u32) -> Span {
    tracing::debug_span!("attempt", attempt, budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_span_declares_late_fields() {
        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = generation_span(GenerationId::random(), Technique::Story);
            let metadata = span.metadata().unwrap();
            assert_eq!(metadata.name(), "generation");
            for field in ["generation_id", "technique", "version", "attempts"] {
                assert!(metadata.fields().field(field).is_some(), "{field}");
            }
        });
    }
}
