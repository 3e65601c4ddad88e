//! Immutable, copy-on-read registry of validated templates.

use std::collections::BTreeMap;

use learn_primitives::{Technique, TemplateVersion};
use serde_json::Value;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::template::{Template, TemplateMetadata};

/// Registry of templates built once at startup and shared by reference.
///
/// There is no mutation path after [`TemplateStore::register`]; wrap the store
/// in an `Arc` to share it between concurrent generations.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    // Versions per technique, ascending by numeric (major, minor, patch).
    templates: BTreeMap<Technique, Vec<Template>>,
}

impl TemplateStore {
    /// Validates every definition and builds the store.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Configuration`] if any definition is malformed,
    /// inconsistent, or declares a `(technique, version)` pair twice.
    pub fn register<I>(definitions: I) -> TemplateResult<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut templates: BTreeMap<Technique, Vec<Template>> = BTreeMap::new();

        for definition in definitions {
            let template = Template::from_definition(definition)?;
            let versions = templates.entry(template.technique).or_default();
            if versions.iter().any(|existing| existing.version == template.version) {
                return Err(TemplateError::configuration(
                    template.key().to_string(),
                    "duplicate template version",
                ));
            }
            debug!(template = %template.key(), "template registered");
            versions.push(template);
        }

        for versions in templates.values_mut() {
            versions.sort_by(|a, b| a.version.cmp(&b.version));
        }

        Ok(Self { templates })
    }

    /// Returns a deep copy of the requested template.
    ///
    /// Without a version the numerically highest registered version is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownTechnique`] when nothing is registered for
    /// the technique and [`TemplateError::UnknownVersion`] when the explicit
    /// version does not exist.
    pub fn get(&self, technique: Technique, version: Option<&str>) -> TemplateResult<Template> {
        let versions = self
            .templates
            .get(&technique)
            .filter(|versions| !versions.is_empty())
            .ok_or(TemplateError::UnknownTechnique { technique })?;

        let template = match version {
            Some(requested) => versions
                .iter()
                .find(|template| template.version.as_str() == requested)
                .ok_or_else(|| TemplateError::UnknownVersion {
                    technique,
                    version: requested.to_owned(),
                })?,
            None => versions
                .last()
                .ok_or(TemplateError::UnknownTechnique { technique })?,
        };

        Ok(template.clone())
    }

    /// Lists the latest version of every registered technique, in technique order.
    ///
    /// Metadata only; repeated calls return identical results.
    #[must_use]
    pub fn list(&self) -> Vec<TemplateMetadata> {
        self.templates
            .values()
            .filter_map(|versions| versions.last())
            .map(Template::metadata)
            .collect()
    }

    /// Returns every registered version of a technique, ascending.
    #[must_use]
    pub fn versions(&self, technique: Technique) -> Vec<TemplateVersion> {
        self.templates
            .get(&technique)
            .map(|versions| versions.iter().map(|t| t.version.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns the techniques with at least one registered template.
    pub fn techniques(&self) -> impl Iterator<Item = Technique> + '_ {
        self.templates.keys().copied()
    }

    /// Returns the total number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.values().map(Vec::len).sum()
    }

    /// Returns true when no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
