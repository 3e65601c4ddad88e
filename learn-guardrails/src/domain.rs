//! Technique-specific contracts stricter than the schema sent to the oracle.
//!
//! Providers may claim schema-constrained output and still return payloads
//! that drift; these contracts decode the payload into its typed result and
//! apply the limits the learning flows actually rely on.

use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::sync::Arc;

use learn_primitives::Technique;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::diagnostics::{ContentViolation, Diagnostic, ValidationOutcome, ValidationStage};

/// Generated mnemonic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MnemonicResult {
    /// The mnemonic sentence or acrostic.
    pub mnemonic: String,
    /// How to use the mnemonic.
    pub explanation: String,
    /// Words tying the mnemonic to the concept.
    pub keywords: Vec<String>,
}

/// Generated story.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResult {
    /// Story text.
    pub story: String,
    /// One or two sentence summary.
    pub summary: String,
    /// Points to remember.
    pub key_points: Vec<String>,
}

/// One indexed flashcard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// 1-based position. Integral JSON floats such as `2.0` are accepted.
    #[serde(deserialize_with = "deserialize_index")]
    pub index: u32,
    /// Prompt side.
    pub question: String,
    /// Answer side.
    pub answer: String,
}

/// Generated flashcard deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardsResult {
    /// Cards in generation order.
    pub flashcards: Vec<Flashcard>,
}

fn deserialize_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let number = Number::deserialize(deserializer)?;
    card_index(&number).map_err(D::Error::custom)
}

/// Reads a 1-based card index from any integral JSON number.
fn card_index(number: &Number) -> Result<u32, &'static str> {
    let index = match number.as_u64() {
        Some(index) => index,
        None => whole_number(number)?,
    };
    if index < 1 {
        return Err("must be at least 1");
    }
    u32::try_from(index).map_err(|_| "exceeds the largest supported index")
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
fn whole_number(number: &Number) -> Result<u64, &'static str> {
    let value = number
        .as_f64()
        .filter(|value| value.fract() == 0.0)
        .ok_or("must be an integer")?;
    if value < 1.0 {
        return Err("must be at least 1");
    }
    if value > f64::from(u32::MAX) {
        return Err("exceeds the largest supported index");
    }
    Ok(value as u64)
}

/// Deck shape decoded before card rules run, so index problems get a
/// per-card diagnostic.
#[derive(Deserialize)]
struct RawDeck {
    flashcards: Vec<RawCard>,
}

#[derive(Deserialize)]
struct RawCard {
    index: Number,
    question: String,
    answer: String,
}

/// Coaching advice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachResult {
    /// Recommended technique.
    pub technique: Technique,
    /// What to do.
    pub advice: String,
    /// Why it fits.
    pub rationale: String,
}

/// Extra validation applied to a schema- and guardrail-valid payload.
pub trait DomainContract: Send + Sync {
    /// Technique the contract belongs to.
    fn technique(&self) -> Technique;

    /// Checks the payload, reporting every violated rule.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationStage::Domain`] violation.
    fn check(&self, payload: &Value) -> ValidationOutcome<()>;
}

/// Contract satisfied by any payload that decodes into `T`.
pub struct DecodeContract<T> {
    technique: Technique,
    _result: PhantomData<fn() -> T>,
}

impl<T> DecodeContract<T> {
    /// Creates a decode-only contract for the technique.
    #[must_use]
    pub const fn new(technique: Technique) -> Self {
        Self {
            technique,
            _result: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> DomainContract for DecodeContract<T> {
    fn technique(&self) -> Technique {
        self.technique
    }

    fn check(&self, payload: &Value) -> ValidationOutcome<()> {
        decode::<T>(payload).map(|_| ())
    }
}

/// Flashcard deck limits: card count, 1-based indexes, question and answer lengths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashcardsContract {
    /// Accepted number of cards.
    pub cards: RangeInclusive<usize>,
    /// Minimum question length in characters.
    pub min_question_chars: usize,
    /// Accepted answer length in characters.
    pub answer_chars: RangeInclusive<usize>,
}

impl Default for FlashcardsContract {
    fn default() -> Self {
        Self {
            cards: 5..=7,
            min_question_chars: 5,
            answer_chars: 1..=25,
        }
    }
}

impl FlashcardsContract {
    /// Decodes and validates a deck, returning it on success.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationStage::Domain`] violation listing every offending
    /// card field.
    pub fn validate(&self, payload: &Value) -> ValidationOutcome<FlashcardsResult> {
        let deck: RawDeck = decode(payload)?;
        let mut diagnostics = Vec::new();

        let count = deck.flashcards.len();
        if !self.cards.contains(&count) {
            diagnostics.push(Diagnostic::new(
                "flashcards",
                format!(
                    "expected between {} and {} cards, got {count}",
                    self.cards.start(),
                    self.cards.end()
                ),
            ));
        }

        let mut flashcards = Vec::with_capacity(count);
        for (position, card) in deck.flashcards.into_iter().enumerate() {
            let path = |field: &str| format!("flashcards[{position}].{field}");
            let index = card_index(&card.index).unwrap_or_else(|reason| {
                diagnostics.push(Diagnostic::new(path("index"), reason));
                0
            });
            if card.question.chars().count() < self.min_question_chars {
                diagnostics.push(Diagnostic::new(
                    path("question"),
                    format!("must be at least {} characters", self.min_question_chars),
                ));
            }
            let answer_len = card.answer.chars().count();
            if answer_len < *self.answer_chars.start() {
                diagnostics.push(Diagnostic::new(path("answer"), "must not be empty"));
            } else if answer_len > *self.answer_chars.end() {
                diagnostics.push(Diagnostic::new(
                    path("answer"),
                    format!(
                        "exceeds max length ({answer_len} > {})",
                        self.answer_chars.end()
                    ),
                ));
            }
            flashcards.push(Flashcard {
                index,
                question: card.question,
                answer: card.answer,
            });
        }

        if diagnostics.is_empty() {
            Ok(FlashcardsResult { flashcards })
        } else {
            Err(ContentViolation::new(ValidationStage::Domain, diagnostics))
        }
    }
}

impl DomainContract for FlashcardsContract {
    fn technique(&self) -> Technique {
        Technique::FlashcardsIndex
    }

    fn check(&self, payload: &Value) -> ValidationOutcome<()> {
        self.validate(payload).map(|_| ())
    }
}

/// Returns the built-in contract for a technique.
#[must_use]
pub fn builtin_contract(technique: Technique) -> Arc<dyn DomainContract> {
    match technique {
        Technique::Mnemonic => Arc::new(DecodeContract::<MnemonicResult>::new(technique)),
        Technique::Story => Arc::new(DecodeContract::<StoryResult>::new(technique)),
        Technique::FlashcardsIndex => Arc::new(FlashcardsContract::default()),
        Technique::Coach => Arc::new(DecodeContract::<CoachResult>::new(technique)),
    }
}

fn decode<T: DeserializeOwned>(payload: &Value) -> ValidationOutcome<T> {
    T::deserialize(payload).map_err(|err| {
        ContentViolation::single(
            ValidationStage::Domain,
            Diagnostic::root(format!("payload does not match the expected shape: {err}")),
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn deck(count: u32, answer: &str) -> Value {
        let cards: Vec<Value> = (1..=count)
            .map(|index| json!({ "index": index, "question": format!("Domanda {index}"), "answer": answer }))
            .collect();
        json!({ "flashcards": cards })
    }

    #[test]
    fn compliant_deck_passes() {
        let deck = FlashcardsContract::default()
            .validate(&deck(5, "Risposta breve"))
            .unwrap();
        assert_eq!(deck.flashcards.len(), 5);
        assert_eq!(deck.flashcards[4].index, 5);
    }

    #[test]
    fn long_answers_are_reported_per_card() {
        let answer = "Risposta decisamente troppo lunga per una flashcard breve";
        assert_eq!(answer.chars().count(), 57);

        let err = FlashcardsContract::default()
            .check(&deck(5, answer))
            .expect_err("answers too long");
        assert_eq!(err.stage(), ValidationStage::Domain);
        assert_eq!(err.diagnostics().len(), 5);
        assert_eq!(
            err.diagnostics()[2].to_string(),
            "flashcards[2].answer: exceeds max length (57 > 25)"
        );
    }

    #[test]
    fn card_count_is_bounded() {
        for count in [4, 8] {
            let err = FlashcardsContract::default()
                .check(&deck(count, "ok"))
                .expect_err("count out of range");
            assert_eq!(err.diagnostics()[0].path(), "flashcards");
        }
    }

    #[test]
    fn short_questions_and_zero_index_fail() {
        let payload = json!({ "flashcards": [
            { "index": 0, "question": "Chi?", "answer": "Io" },
            { "index": 2, "question": "Domanda 2", "answer": "" },
            { "index": 3, "question": "Domanda 3", "answer": "c" },
            { "index": 4, "question": "Domanda 4", "answer": "d" },
            { "index": 5, "question": "Domanda 5", "answer": "e" }
        ]});
        let err = FlashcardsContract::default().check(&payload).expect_err("invalid cards");
        let paths: Vec<&str> = err.diagnostics().iter().map(Diagnostic::path).collect();
        assert_eq!(
            paths,
            ["flashcards[0].index", "flashcards[0].question", "flashcards[1].answer"]
        );
    }

    #[test]
    fn integral_float_indexes_are_accepted() {
        let cards: Vec<Value> = (1..=5_u32)
            .map(|index| json!({ "index": f64::from(index), "question": format!("Domanda {index}"), "answer": "Sì" }))
            .collect();
        let payload = json!({ "flashcards": cards });
        assert_eq!(payload["flashcards"][0]["index"].to_string(), "1.0");

        let deck = FlashcardsContract::default().validate(&payload).unwrap();
        let indexes: Vec<u32> = deck.flashcards.iter().map(|card| card.index).collect();
        assert_eq!(indexes, [1, 2, 3, 4, 5]);

        let typed: FlashcardsResult = serde_json::from_value(payload).unwrap();
        assert_eq!(typed.flashcards[4].index, 5);
    }

    #[test]
    fn fractional_and_negative_indexes_are_reported_per_card() {
        let mut payload = deck(5, "ok");
        payload["flashcards"][1]["index"] = json!(2.5);
        payload["flashcards"][3]["index"] = json!(-4);

        let err = FlashcardsContract::default().check(&payload).expect_err("bad indexes");
        let rendered: Vec<String> = err.diagnostics().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "flashcards[1].index: must be an integer",
                "flashcards[3].index: must be at least 1"
            ]
        );
    }

    #[test]
    fn decode_contracts_reject_wrong_shapes() {
        let contract = builtin_contract(Technique::Mnemonic);
        assert_eq!(contract.technique(), Technique::Mnemonic);
        assert!(contract
            .check(&json!({ "mnemonic": "m", "explanation": "e", "keywords": ["k"] }))
            .is_ok());
        let err = contract
            .check(&json!({ "mnemonic": "m", "explanation": "e", "keywords": "k" }))
            .expect_err("keywords must be a list");
        assert_eq!(err.stage(), ValidationStage::Domain);
    }

    #[test]
    fn coach_contract_requires_known_technique() {
        let contract = builtin_contract(Technique::Coach);
        let ok = json!({ "technique": "story_it", "advice": "Racconta una storia", "rationale": "Perché" });
        assert!(contract.check(&ok).is_ok());
        let bad = json!({ "technique": "rhymes", "advice": "a", "rationale": "b" });
        assert!(contract.check(&bad).is_err());
    }

    #[test]
    fn story_contract_reads_camel_case_fields() {
        let contract = builtin_contract(Technique::Story);
        let payload = json!({ "story": "C'era una volta", "summary": "Breve", "keyPoints": ["uno"] });
        assert!(contract.check(&payload).is_ok());
    }
}
