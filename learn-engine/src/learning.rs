//! Typed learning flows over the orchestrator.

use learn_guardrails::{CoachResult, Flashcard, FlashcardsResult, MnemonicResult, StoryResult};
use learn_primitives::{GenerationId, Technique, TemplateVersion};
use learn_prompts::TemplateMetadata;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};
use crate::orchestrator::GenerationOrchestrator;

/// Term to turn into a mnemonic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MnemonicInput {
    /// Term to remember.
    pub term: String,
    /// Its definition.
    pub definition: String,
}

/// Concepts to weave into a story.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryInput {
    /// Concepts the story must cover.
    pub concepts: Vec<String>,
    /// Who the story is for.
    pub target_audience: String,
    /// What the reader should learn.
    pub learning_goal: String,
}

/// One source item for a flashcard deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardItem {
    /// Term.
    pub term: String,
    /// Definition.
    pub definition: String,
}

/// Material for a flashcard deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardsInput {
    /// Deck topic.
    pub topic: String,
    /// Source items.
    pub items: Vec<FlashcardItem>,
}

/// Learner level for coaching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoachLevel {
    /// New to the topic.
    Beginner,
    /// Knows the basics.
    Intermediate,
    /// Comfortable with the topic.
    Advanced,
}

/// Coaching request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachInput {
    /// Topic being studied.
    pub topic: String,
    /// Learner level.
    pub level: CoachLevel,
}

/// Flashcard deck tagged with its topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    /// Topic from the request.
    pub topic: String,
    /// Generated cards.
    pub flashcards: Vec<Flashcard>,
}

/// Coaching advice echoing the request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachAdvice {
    /// Topic from the request.
    pub topic: String,
    /// Level from the request.
    pub level: CoachLevel,
    /// Recommended technique.
    pub technique: Technique,
    /// What to do.
    pub advice: String,
    /// Why it fits.
    pub rationale: String,
}

/// Typed content with its generation bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningArtifact<T> {
    /// Generation identifier.
    pub id: GenerationId,
    /// Template version used.
    pub version: TemplateVersion,
    /// Attempt whose candidate was accepted.
    pub attempts: u32,
    /// Decoded content.
    pub content: T,
}

impl<T> LearningArtifact<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> LearningArtifact<U> {
        LearningArtifact {
            id: self.id,
            version: self.version,
            attempts: self.attempts,
            content: f(self.content),
        }
    }
}

/// Learning flows with typed inputs and outputs.
#[derive(Clone, Debug)]
pub struct LearningService {
    orchestrator: GenerationOrchestrator,
}

impl LearningService {
    /// Wraps an orchestrator.
    #[must_use]
    pub fn new(orchestrator: GenerationOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Returns the underlying orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    /// Lists available techniques at their latest versions.
    #[must_use]
    pub fn list_techniques(&self) -> Vec<TemplateMetadata> {
        self.orchestrator.list_templates()
    }

    /// Generates a mnemonic for a term, using the latest template unless
    /// `version` names one.
    ///
    /// # Errors
    ///
    /// See [`GenerationOrchestrator::generate`].
    pub async fn create_mnemonic(
        &self,
        input: &MnemonicInput,
        version: Option<&str>,
    ) -> GenerationResult<LearningArtifact<MnemonicResult>> {
        self.run(Technique::Mnemonic, input, version).await
    }

    /// Generates a story linking several concepts.
    ///
    /// # Errors
    ///
    /// See [`GenerationOrchestrator::generate`].
    pub async fn create_story(
        &self,
        input: &StoryInput,
        version: Option<&str>,
    ) -> GenerationResult<LearningArtifact<StoryResult>> {
        self.run(Technique::Story, input, version).await
    }

    /// Generates an indexed flashcard deck for a topic.
    ///
    /// # Errors
    ///
    /// See [`GenerationOrchestrator::generate`].
    pub async fn create_flashcards(
        &self,
        input: &FlashcardsInput,
        version: Option<&str>,
    ) -> GenerationResult<LearningArtifact<FlashcardDeck>> {
        let artifact = self
            .run::<FlashcardsResult, _>(Technique::FlashcardsIndex, input, version)
            .await?;
        Ok(artifact.map(|deck| FlashcardDeck {
            topic: input.topic.trim().to_owned(),
            flashcards: deck.flashcards,
        }))
    }

    /// Recommends a technique for a topic and learner level.
    ///
    /// # Errors
    ///
    /// See [`GenerationOrchestrator::generate`].
    pub async fn coach(&self, input: &CoachInput) -> GenerationResult<LearningArtifact<CoachAdvice>> {
        let artifact = self.run::<CoachResult, _>(Technique::Coach, input, None).await?;
        Ok(artifact.map(|result| CoachAdvice {
            topic: input.topic.trim().to_owned(),
            level: input.level,
            technique: result.technique,
            advice: result.advice,
            rationale: result.rationale,
        }))
    }

    async fn run<T, I>(
        &self,
        technique: Technique,
        input: &I,
        version: Option<&str>,
    ) -> GenerationResult<LearningArtifact<T>>
    where
        T: DeserializeOwned,
        I: Serialize + Sync,
    {
        let input = serde_json::to_value(input).map_err(|err| {
            GenerationError::configuration(format!("{technique} input is not serializable: {err}"))
        })?;
        let artifact = self.orchestrator.generate(technique, &input, version).await?;
        let content = artifact.decode()?;
        Ok(LearningArtifact {
            id: artifact.id,
            version: artifact.version,
            attempts: artifact.attempts,
            content,
        })
    }
}
