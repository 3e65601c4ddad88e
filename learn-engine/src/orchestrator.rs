//! Render, call, validate, and retry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use learn_adapters::traits::{CompletionClient, JsonCompletionRequest};
use learn_config::{AttemptBudgets, StudioConfig};
use learn_guardrails::{
    ContentViolation, DomainContract, SchemaCache, ValidationOutcome, builtin_contract,
    enforce_guardrails, parse_response,
};
use learn_primitives::{GenerationId, Technique};
use learn_prompts::{Template, TemplateMetadata, TemplateStore, render_prompt};
use serde_json::Value;
use tracing::{Instrument, Span, debug, info, warn};

use crate::artifact::{GeneratedArtifact, trim_strings};
use crate::error::{GenerationError, GenerationResult};
use crate::input::InputContracts;
use crate::spans::{attempt_span, generation_span};

/// Lower bound on the output tokens requested per attempt.
pub const MIN_MAX_TOKENS: u32 = 128;

/// Output token budget derived from a template's `maxAnswerLength`.
#[must_use]
pub const fn token_budget(max_answer_length: u32) -> u32 {
    let budget = max_answer_length.div_ceil(4);
    if budget < MIN_MAX_TOKENS {
        MIN_MAX_TOKENS
    } else {
        budget
    }
}

/// Result of one render-call-validate cycle.
enum AttemptOutcome {
    /// Candidate passed every stage; payload is already trimmed.
    Accepted(Value),
    /// Candidate failed content validation; another attempt may fix it.
    Retryable(ContentViolation),
    /// Nothing a new attempt can fix.
    Fatal(GenerationError),
}

/// Turns a technique, caller input, and optional template version into a
/// validated artifact, retrying on content failures.
///
/// Cloning is cheap; clones share the template store, client, and compiled
/// schema cache.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    templates: Arc<TemplateStore>,
    client: Arc<dyn CompletionClient>,
    schemas: Arc<SchemaCache>,
    inputs: Arc<InputContracts>,
    contracts: BTreeMap<Technique, Arc<dyn DomainContract>>,
    budgets: AttemptBudgets,
    temperature: Option<f32>,
}

impl fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.client.metadata();
        f.debug_struct("GenerationOrchestrator")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("templates", &self.templates.len())
            .field("budgets", &self.budgets)
            .finish_non_exhaustive()
    }
}

impl GenerationOrchestrator {
    /// Creates an orchestrator with default attempt budgets and the built-in
    /// domain contracts.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Configuration`] if an input contract does
    /// not compile.
    pub fn new(
        templates: Arc<TemplateStore>,
        client: Arc<dyn CompletionClient>,
    ) -> GenerationResult<Self> {
        let contracts = Technique::ALL
            .into_iter()
            .map(|technique| (technique, builtin_contract(technique)))
            .collect();
        Ok(Self {
            templates,
            client,
            schemas: Arc::new(SchemaCache::new()),
            inputs: Arc::new(InputContracts::builtin()?),
            contracts,
            budgets: AttemptBudgets::default(),
            temperature: None,
        })
    }

    /// Creates an orchestrator using the budgets and sampling settings of `config`.
    ///
    /// # Errors
    ///
    /// See [`GenerationOrchestrator::new`].
    pub fn from_config(
        config: &StudioConfig,
        templates: Arc<TemplateStore>,
        client: Arc<dyn CompletionClient>,
    ) -> GenerationResult<Self> {
        let mut orchestrator = Self::new(templates, client)?.with_budgets(config.attempts.clone());
        orchestrator.temperature = config.oracle.temperature;
        Ok(orchestrator)
    }

    /// Replaces the attempt budgets.
    #[must_use]
    pub fn with_budgets(mut self, budgets: AttemptBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Replaces the domain contract of the contract's technique.
    #[must_use]
    pub fn with_domain_contract(mut self, contract: Arc<dyn DomainContract>) -> Self {
        self.contracts.insert(contract.technique(), contract);
        self
    }

    /// Returns the shared template store.
    #[must_use]
    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.templates
    }

    /// Returns the attempt budgets in effect.
    #[must_use]
    pub fn budgets(&self) -> &AttemptBudgets {
        &self.budgets
    }

    /// Lists the latest version of every registered technique, without
    /// response schemas.
    #[must_use]
    pub fn list_templates(&self) -> Vec<TemplateMetadata> {
        self.templates.list()
    }

    /// Generates one artifact.
    ///
    /// The template is resolved (latest version when `version` is `None`),
    /// the input checked, and up to the technique's budget of attempts made.
    /// Dropping the returned future cancels the in-flight oracle call.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::NotFound`] for an unknown technique or version.
    /// - [`GenerationError::InvalidInput`] when the input breaks its contract;
    ///   the oracle is not called.
    /// - [`GenerationError::Oracle`] when the completion call fails; not retried.
    /// - [`GenerationError::UnprocessableContent`] when every attempt fails
    ///   validation, carrying the last attempt's diagnostics.
    /// - [`GenerationError::Configuration`] when the response schema does not compile.
    pub async fn generate(
        &self,
        technique: Technique,
        input: &Value,
        version: Option<&str>,
    ) -> GenerationResult<GeneratedArtifact> {
        let id = GenerationId::random();
        self.run(id, technique, input, version)
            .instrument(generation_span(id, technique))
            .await
    }

    async fn run(
        &self,
        id: GenerationId,
        technique: Technique,
        input: &Value,
        version: Option<&str>,
    ) -> GenerationResult<GeneratedArtifact> {
        let template = self.templates.get(technique, version)?;
        Span::current().record("version", tracing::field::display(&template.version));

        let input = self.inputs.validate(&template, input)?;
        self.schemas.validator_for(&template)?;

        let contract = self
            .contracts
            .get(&technique)
            .cloned()
            .unwrap_or_else(|| builtin_contract(technique));
        let prompt = render_prompt(&template, &input);
        let max_tokens = token_budget(template.guardrails.max_answer_length);
        let budget = self.budgets.budget_for(technique).get();
        debug!(budget, max_tokens, prompt_chars = prompt.chars().count(), "prompt rendered");

        let mut last_violation = None;
        for attempt in 1..=budget {
            let outcome = self
                .attempt(&template, contract.as_ref(), &prompt, max_tokens)
                .instrument(attempt_span(attempt, budget))
                .await;

            match outcome {
                AttemptOutcome::Accepted(payload) => {
                    Span::current().record("attempts", attempt);
                    info!(attempt, budget, "generation accepted");
                    return Ok(GeneratedArtifact {
                        id,
                        technique,
                        version: template.version,
                        attempts: attempt,
                        payload,
                    });
                }
                AttemptOutcome::Retryable(violation) => {
                    warn!(
                        attempt,
                        budget,
                        stage = %violation.stage(),
                        diagnostics = %violation.summary(),
                        "candidate rejected"
                    );
                    last_violation = Some(violation);
                }
                AttemptOutcome::Fatal(err) => {
                    warn!(attempt, error = %err, "generation aborted");
                    return Err(err);
                }
            }
        }

        Span::current().record("attempts", budget);
        let Some(violation) = last_violation else {
            return Err(GenerationError::configuration(format!(
                "attempt budget for {technique} is zero"
            )));
        };
        Err(GenerationError::UnprocessableContent {
            technique,
            attempts: budget,
            stage: violation.stage(),
            diagnostics: violation.diagnostics().to_vec(),
        })
    }

    async fn attempt(
        &self,
        template: &Template,
        contract: &dyn DomainContract,
        prompt: &str,
        max_tokens: u32,
    ) -> AttemptOutcome {
        let request =
            match JsonCompletionRequest::new(prompt, template.response_schema.clone(), max_tokens) {
                Ok(request) => match self.temperature {
                    Some(temperature) => request.with_temperature(temperature),
                    None => request,
                },
                Err(err) => return AttemptOutcome::Fatal(err.into()),
            };

        let raw = match self.client.complete_json(request).await {
            Ok(raw) => raw,
            Err(err) => return AttemptOutcome::Fatal(GenerationError::Oracle(err)),
        };
        debug!(response_chars = raw.chars().count(), "completion received");

        match self.vet(template, contract, &raw) {
            Ok(Ok(payload)) => AttemptOutcome::Accepted(payload),
            Ok(Err(violation)) => AttemptOutcome::Retryable(violation),
            Err(err) => AttemptOutcome::Fatal(err),
        }
    }

    /// Runs parse, schema, guardrail, and domain stages, then trims.
    fn vet(
        &self,
        template: &Template,
        contract: &dyn DomainContract,
        raw: &str,
    ) -> GenerationResult<ValidationOutcome<Value>> {
        let payload = match parse_response(raw) {
            Ok(payload) => payload,
            Err(violation) => return Ok(Err(violation)),
        };

        let checked = self
            .schemas
            .check(template, &payload)?
            .and_then(|()| enforce_guardrails(&template.guardrails, &payload))
            .and_then(|()| contract.check(&payload));

        Ok(checked.map(|()| {
            let mut payload = payload;
            trim_strings(&mut payload);
            payload
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_budget_has_a_floor() {
        assert_eq!(token_budget(0), MIN_MAX_TOKENS);
        assert_eq!(token_budget(512), MIN_MAX_TOKENS);
        assert_eq!(token_budget(513), 129);
        assert_eq!(token_budget(1200), 300);
        assert_eq!(token_budget(1201), 301);
    }
}
