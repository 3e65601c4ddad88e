//! Technique identifiers and the supported template locale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A supported generation flow.
///
/// The set is closed: templates, input contracts, and domain contracts are all
/// keyed by this enum.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Technique {
    /// Acrostic or phrase mnemonic for a single term.
    #[serde(rename = "mnemonic_it")]
    Mnemonic,
    /// Short narrative linking several concepts.
    #[serde(rename = "story_it")]
    Story,
    /// Indexed question/answer flashcards for a topic.
    #[serde(rename = "flashcards_index_it")]
    FlashcardsIndex,
    /// Advice on which technique suits a learner.
    #[serde(rename = "coach_it")]
    Coach,
}

impl Technique {
    /// Every technique in declaration order.
    pub const ALL: [Self; 4] = [Self::Mnemonic, Self::Story, Self::FlashcardsIndex, Self::Coach];

    /// Returns the wire identifier (e.g. `flashcards_index_it`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mnemonic => "mnemonic_it",
            Self::Story => "story_it",
            Self::FlashcardsIndex => "flashcards_index_it",
            Self::Coach => "coach_it",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|technique| technique.as_str() == s)
            .ok_or_else(|| Error::UnknownTechnique { id: s.to_owned() })
    }
}

/// Locale of template prompts and generated content.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Italian, the only locale templates are authored in.
    #[default]
    #[serde(rename = "it")]
    Italian,
}

impl Language {
    /// Returns the ISO 639-1 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Italian => "it",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "it" => Ok(Self::Italian),
            other => Err(Error::UnsupportedLanguage {
                code: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_match_serde_names() {
        for technique in Technique::ALL {
            let encoded = serde_json::to_string(&technique).unwrap();
            assert_eq!(encoded, format!("\"{}\"", technique.as_str()));
            assert_eq!(technique.as_str().parse::<Technique>().unwrap(), technique);
        }
    }

    #[test]
    fn unknown_technique_is_rejected() {
        let err = "unknown-technique".parse::<Technique>().expect_err("unknown");
        assert!(matches!(err, Error::UnknownTechnique { .. }));
    }

    #[test]
    fn only_italian_is_supported() {
        assert_eq!("it".parse::<Language>().unwrap(), Language::Italian);
        assert!("en".parse::<Language>().is_err());
    }
}
