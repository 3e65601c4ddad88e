//! Template version strings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A semantic-version-like string ordered by its numeric `(major, minor, patch)`.
///
/// Each dot-separated segment contributes its leading digits; a segment without
/// leading digits, or a missing minor/patch segment, counts as `0`. Equal
/// numeric keys fall back to comparing the raw strings so the ordering stays
/// total and consistent with equality.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TemplateVersion {
    raw: String,
    key: (u64, u64, u64),
}

impl TemplateVersion {
    /// Parses a version string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the string is empty or whitespace.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(Error::InvalidVersion {
                version: raw,
                reason: "version cannot be empty".into(),
            });
        }
        let key = numeric_key(&raw);
        Ok(Self { raw, key })
    }

    /// Returns the version string as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the numeric `(major, minor, patch)` triple.
    #[must_use]
    pub const fn numeric(&self) -> (u64, u64, u64) {
        self.key
    }
}

fn numeric_key(raw: &str) -> (u64, u64, u64) {
    let mut segments = raw.split('.').map(leading_number);
    let major = segments.next().unwrap_or(0);
    let minor = segments.next().unwrap_or(0);
    let patch = segments.next().unwrap_or(0);
    (major, minor, patch)
}

fn leading_number(segment: &str) -> u64 {
    let digits: String = segment
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

impl Ord for TemplateVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for TemplateVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TemplateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for TemplateVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for TemplateVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for TemplateVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> TemplateVersion {
        TemplateVersion::parse(raw).expect("version")
    }

    #[test]
    fn orders_numerically_not_lexically() {
        assert!(v("1.10.0") > v("1.9.3"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert!(v("1.0.10") > v("1.0.2"));
    }

    #[test]
    fn non_numeric_segments_count_as_zero() {
        assert_eq!(v("beta.2.1").numeric(), (0, 2, 1));
        assert_eq!(v("1.x.3").numeric(), (1, 0, 3));
        assert_eq!(v("2").numeric(), (2, 0, 0));
        assert_eq!(v("1.2.3-rc1").numeric(), (1, 2, 3));
    }

    #[test]
    fn empty_version_is_invalid() {
        let err = TemplateVersion::parse("  ").expect_err("empty");
        assert!(matches!(err, Error::InvalidVersion { .. }));
    }

    #[test]
    fn max_picks_highest_numeric_version() {
        let versions = [v("1.2.0"), v("1.10.0"), v("1.9.9")];
        let latest = versions.iter().max().unwrap();
        assert_eq!(latest.as_str(), "1.10.0");
    }
}
