use std::sync::Arc;

use learn_adapters::scripted::ScriptedClient;
use learn_adapters::traits::CompletionClient;
use learn_engine::{
    CoachInput, CoachLevel, FlashcardItem, FlashcardsInput, GenerationError,
    GenerationOrchestrator, LearningService, MnemonicInput, StoryInput,
};
use learn_primitives::Technique;
use learn_prompts::{TemplateStore, builtin_definitions};
use serde_json::json;

fn service(client: &Arc<ScriptedClient>) -> LearningService {
    let templates = Arc::new(TemplateStore::builtin().expect("builtin catalog"));
    let orchestrator =
        GenerationOrchestrator::new(templates, Arc::clone(client) as Arc<dyn CompletionClient>)
            .expect("orchestrator");
    LearningService::new(orchestrator)
}

#[tokio::test]
async fn flashcards_carry_the_requested_topic() {
    let cards: Vec<_> = (1..=6)
        .map(|index| json!({ "index": index, "question": format!("Domanda {index}?"), "answer": " Sì " }))
        .collect();
    let client = Arc::new(ScriptedClient::with_responses([
        json!({ "flashcards": cards }).to_string(),
    ]));

    let deck = service(&client)
        .create_flashcards(
            &FlashcardsInput {
                topic: "  Fotosintesi ".into(),
                items: vec![FlashcardItem {
                    term: "Clorofilla".into(),
                    definition: "Pigmento verde".into(),
                }],
            },
            None,
        )
        .await
        .expect("deck");

    assert_eq!(deck.content.topic, "Fotosintesi");
    assert_eq!(deck.content.flashcards.len(), 6);
    assert_eq!(deck.content.flashcards[0].answer, "Sì");
    assert_eq!(deck.attempts, 1);
}

#[tokio::test]
async fn coaching_echoes_topic_and_level() {
    let client = Arc::new(ScriptedClient::with_responses([json!({
        "technique": "story_it",
        "advice": "Trasforma le date in una storia con personaggi ricorrenti.",
        "rationale": "Le narrazioni aiutano a ordinare gli eventi."
    })
    .to_string()]));

    let advice = service(&client)
        .coach(&CoachInput {
            topic: "Rivoluzione francese".into(),
            level: CoachLevel::Beginner,
        })
        .await
        .expect("advice");

    assert_eq!(advice.content.topic, "Rivoluzione francese");
    assert_eq!(advice.content.level, CoachLevel::Beginner);
    assert_eq!(advice.content.technique, Technique::Story);
}

#[tokio::test]
async fn coaching_rejects_unknown_techniques() {
    let client = Arc::new(ScriptedClient::with_responses([json!({
        "technique": "coach_it",
        "advice": "Chiedi a un tutor di seguirti ogni settimana.",
        "rationale": "Serve costanza."
    })
    .to_string()]));

    let err = service(&client)
        .coach(&CoachInput {
            topic: "Chimica".into(),
            level: CoachLevel::Advanced,
        })
        .await
        .expect_err("coach may not recommend itself");

    assert!(matches!(err, GenerationError::UnprocessableContent { attempts: 1, .. }));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn story_and_mnemonic_decode_typed_content() {
    let client = Arc::new(ScriptedClient::with_responses([
        json!({
            "story": "Un atomo curioso incontra una molecola.",
            "summary": "Atomi e molecole.",
            "keyPoints": ["atomo", "molecola"]
        })
        .to_string(),
        json!({
            "mnemonic": "MARE",
            "explanation": "Molecole Attratte Restano Esposte",
            "keywords": ["molecola"]
        })
        .to_string(),
    ]));
    let service = service(&client);

    let story = service
        .create_story(
            &StoryInput {
                concepts: vec!["atomo".into(), "molecola".into()],
                target_audience: "scuola media".into(),
                learning_goal: "distinguere atomi e molecole".into(),
            },
            None,
        )
        .await
        .expect("story");
    assert_eq!(story.content.key_points, ["atomo", "molecola"]);

    let mnemonic = service
        .create_mnemonic(
            &MnemonicInput {
                term: "Molecola".into(),
                definition: "Gruppo di atomi legati".into(),
            },
            None,
        )
        .await
        .expect("mnemonic");
    assert_eq!(mnemonic.content.mnemonic, "MARE");
    assert_ne!(story.id, mnemonic.id);
}

#[tokio::test]
async fn empty_typed_input_is_invalid() {
    let client = Arc::new(ScriptedClient::new());
    let err = service(&client)
        .create_mnemonic(
            &MnemonicInput {
                term: String::new(),
                definition: "Qualcosa".into(),
            },
            None,
        )
        .await
        .expect_err("empty term");

    assert!(matches!(err, GenerationError::InvalidInput { .. }));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn typed_flows_select_a_template_version() {
    let mut definitions = builtin_definitions().expect("catalog");
    let mut newer = definitions[0].clone();
    newer["version"] = json!("2.0.0");
    definitions.push(newer);
    let templates = Arc::new(TemplateStore::register(definitions).expect("store"));

    let client = Arc::new(ScriptedClient::with_responses([
        json!({ "mnemonic": "MARE", "explanation": "Iniziali", "keywords": ["mare"] }).to_string(),
    ]));
    let service = LearningService::new(
        GenerationOrchestrator::new(templates, Arc::clone(&client) as Arc<dyn CompletionClient>)
            .expect("orchestrator"),
    );
    let input = MnemonicInput {
        term: "Mare".into(),
        definition: "Distesa d'acqua salata".into(),
    };

    let pinned = service
        .create_mnemonic(&input, Some("1.0.0"))
        .await
        .expect("pinned version");
    assert_eq!(pinned.version.as_str(), "1.0.0");

    let err = service
        .create_mnemonic(&input, Some("9.9.9"))
        .await
        .expect_err("unknown version");
    assert!(matches!(err, GenerationError::NotFound(_)));

    let err = service
        .create_story(
            &StoryInput {
                concepts: vec!["atomo".into()],
                target_audience: "liceo".into(),
                learning_goal: "capire".into(),
            },
            Some("3.0.0"),
        )
        .await
        .expect_err("unknown story version");
    assert!(matches!(err, GenerationError::NotFound(_)));
    assert_eq!(client.calls(), 1);
}

#[test]
fn techniques_are_listed_in_catalog_order() {
    let client = Arc::new(ScriptedClient::new());
    let techniques: Vec<String> = service(&client)
        .list_techniques()
        .into_iter()
        .map(|meta| format!("{}@{}", meta.technique, meta.version))
        .collect();
    assert_eq!(
        techniques,
        [
            "mnemonic_it@1.0.0",
            "story_it@1.0.0",
            "flashcards_index_it@1.0.0",
            "coach_it@1.0.0"
        ]
    );
}
