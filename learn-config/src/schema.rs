//! Strongly typed configuration schema.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;

use learn_primitives::Technique;
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    /// Per-technique attempt budgets.
    pub attempts: AttemptBudgets,
    /// Completion provider settings.
    pub oracle: OracleSettings,
}

/// Maximum render-to-validate cycles per technique.
///
/// Techniques without an entry get a single attempt (no retry). Deserialized
/// entries overlay [`AttemptBudgets::default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttemptBudgets(BTreeMap<Technique, NonZeroU32>);

impl AttemptBudgets {
    /// Budget applied to techniques without an explicit entry.
    pub const SINGLE_SHOT: NonZeroU32 = NonZeroU32::MIN;

    /// Creates budgets where every technique is single-shot.
    #[must_use]
    pub fn single_shot() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets the budget for one technique.
    #[must_use]
    pub fn with(mut self, technique: Technique, attempts: NonZeroU32) -> Self {
        self.set(technique, attempts);
        self
    }

    /// Sets the budget for one technique in place.
    pub fn set(&mut self, technique: Technique, attempts: NonZeroU32) {
        self.0.insert(technique, attempts);
    }

    /// Returns the attempt budget for the technique.
    #[must_use]
    pub fn budget_for(&self, technique: Technique) -> NonZeroU32 {
        self.0.get(&technique).copied().unwrap_or(Self::SINGLE_SHOT)
    }
}

impl Default for AttemptBudgets {
    /// Flashcards get one retry; every other flow is single-shot.
    fn default() -> Self {
        Self::single_shot().with(Technique::FlashcardsIndex, NonZeroU32::MIN.saturating_add(1))
    }
}

impl<'de> Deserialize<'de> for AttemptBudgets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = BTreeMap::<Technique, NonZeroU32>::deserialize(deserializer)?;
        let mut budgets = Self::default();
        budgets.0.extend(overrides);
        Ok(budgets)
    }
}

/// Completion provider settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct OracleSettings {
    /// Model identifier.
    pub model: String,
    /// Provider base URL; the provider default when absent.
    pub base_url: Option<String>,
    /// Transport timeout for one completion call, in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature; the provider default when absent.
    pub temperature: Option<f32>,
}

impl OracleSettings {
    /// Returns the transport timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_owned(),
            base_url: None,
            timeout_secs: 60,
            temperature: None,
        }
    }
}
