//! Layered configuration loading.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use learn_primitives::Technique;
use thiserror::Error;
use tracing::debug;

use crate::schema::StudioConfig;

/// Environment variable naming an optional JSON configuration document.
pub const CONFIG_PATH_ENV: &str = "LEARN_CONFIG";

const ENV_PREFIX: &str = "LEARN_";
const ATTEMPTS_PREFIX: &str = "LEARN_ATTEMPTS_";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration document is not valid JSON for [`StudioConfig`].
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Underlying decode error.
        #[from]
        source: serde_json::Error,
    },
    /// A value is present but unusable.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Setting or environment variable name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl StudioConfig {
    /// Parses a JSON document; missing sections keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents or unknown keys
    /// and [`ConfigError::InvalidValue`] when validation fails.
    pub fn from_json_str(document: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`StudioConfig::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration document");
        Self::from_json_str(&document)
    }

    /// Loads configuration from the process environment.
    ///
    /// Starts from defaults, applies the document named by `LEARN_CONFIG` when
    /// set, then applies `LEARN_*` overrides.
    ///
    /// # Errors
    ///
    /// Propagates file, parse, and override errors.
    pub fn from_env() -> ConfigResult<Self> {
        let base = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        base.with_overrides(std::env::vars())
    }

    /// Applies `LEARN_*` overrides from the given variables.
    ///
    /// Recognized keys: `LEARN_ORACLE_MODEL`, `LEARN_ORACLE_BASE_URL`,
    /// `LEARN_ORACLE_TIMEOUT_SECS`, `LEARN_ORACLE_TEMPERATURE`, and
    /// `LEARN_ATTEMPTS_<TECHNIQUE>` where the suffix is a technique id in any
    /// case (e.g. `LEARN_ATTEMPTS_FLASHCARDS_INDEX_IT=3`). Other variables are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable values or unknown
    /// techniques.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            if !key.starts_with(ENV_PREFIX) || key == CONFIG_PATH_ENV {
                continue;
            }

            match key {
                "LEARN_ORACLE_MODEL" => self.oracle.model = value.to_owned(),
                "LEARN_ORACLE_BASE_URL" => self.oracle.base_url = Some(value.to_owned()),
                "LEARN_ORACLE_TIMEOUT_SECS" => {
                    self.oracle.timeout_secs = value
                        .parse()
                        .map_err(|err| ConfigError::invalid(key, format!("{err}")))?;
                }
                "LEARN_ORACLE_TEMPERATURE" => {
                    self.oracle.temperature = Some(
                        value
                            .parse()
                            .map_err(|err| ConfigError::invalid(key, format!("{err}")))?,
                    );
                }
                _ => {
                    if let Some(suffix) = key.strip_prefix(ATTEMPTS_PREFIX) {
                        let technique: Technique = suffix
                            .to_ascii_lowercase()
                            .parse()
                            .map_err(|err| ConfigError::invalid(key, format!("{err}")))?;
                        let attempts: NonZeroU32 = value
                            .parse()
                            .map_err(|err| ConfigError::invalid(key, format!("{err}")))?;
                        self.attempts.set(technique, attempts);
                    } else {
                        debug!(key, "ignoring unrecognized configuration variable");
                        continue;
                    }
                }
            }
            debug!(key, "applied configuration override");
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending setting.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.oracle.model.trim().is_empty() {
            return Err(ConfigError::invalid("oracle.model", "must not be empty"));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "oracle.timeoutSecs",
                "must be greater than zero",
            ));
        }
        if let Some(temperature) = self.oracle.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::invalid(
                    "oracle.temperature",
                    format!("{temperature} is outside 0.0..=2.0"),
                ));
            }
        }
        Ok(())
    }
}
