use learn_guardrails::{
    FlashcardsContract, SchemaCache, ValidationStage, enforce_guardrails, parse_response,
};
use learn_primitives::Technique;
use learn_prompts::TemplateStore;
use serde_json::{Value, json};

#[test]
fn guardrails_catch_fields_the_schema_lets_through() {
    let mut template = TemplateStore::builtin()
        .unwrap()
        .get(Technique::Mnemonic, None)
        .unwrap();
    template.response_schema["required"] = json!(["mnemonic", "explanation"]);

    let payload = json!({ "mnemonic": "ONDA", "explanation": "Iniziali della definizione" });
    let cache = SchemaCache::new();
    assert!(cache.validate(&template, &payload).unwrap().is_empty());

    let violation = enforce_guardrails(&template.guardrails, &payload).expect_err("keywords");
    assert_eq!(violation.stage(), ValidationStage::Guardrail);
    assert_eq!(violation.diagnostics()[0].path(), "keywords");
    assert_eq!(
        violation.to_string(),
        "guardrail check failed: keywords: missing required field (guardrails.requiredFields)"
    );
}

#[test]
fn layers_run_in_order_on_a_wrapped_completion() {
    let template = TemplateStore::builtin()
        .unwrap()
        .get(Technique::FlashcardsIndex, None)
        .unwrap();
    let cards: Vec<Value> = (1..=5)
        .map(|index| json!({ "index": index, "question": format!("Domanda {index}"), "answer": "Risposta" }))
        .collect();
    let raw = format!("Ecco le flashcard:\n{}\nFine.", json!({ "flashcards": cards }));

    let payload = parse_response(&raw).unwrap();
    SchemaCache::new().check(&template, &payload).unwrap().unwrap();
    enforce_guardrails(&template.guardrails, &payload).unwrap();
    let deck = FlashcardsContract::default().validate(&payload).unwrap();
    assert_eq!(deck.flashcards[2].question, "Domanda 3");
}
