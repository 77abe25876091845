//! Validator settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use texlint_syntax::DEFAULT_MAX_TOKENS;

/// Default number of math diagnostics above which all diagnostics are
/// withheld.
pub const DEFAULT_MAX_MATH_ERRORS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read configuration from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What the circuit breaker does after a tokenizer fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BreakerPolicy {
    /// Stay open until [`crate::Validator::reset`] is called.
    #[default]
    Permanent,
    /// Never stay open; every run is attempted.
    PerRun,
    /// Skip the next `runs` runs, then try again.
    Cooldown { runs: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Tokenizer ceiling; documents producing more tokens are rejected.
    pub max_tokens: usize,
    /// Math diagnostics allowed before all diagnostics are withheld.
    pub max_math_errors: usize,
    pub breaker: BreakerPolicy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            max_math_errors: DEFAULT_MAX_MATH_ERRORS,
            breaker: BreakerPolicy::default(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::debug!("loaded validator configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::default();
        assert_eq!(config.max_tokens, 100_000);
        assert_eq!(config.max_math_errors, 10);
        assert_eq!(config.breaker, BreakerPolicy::Permanent);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ValidatorConfig::from_json(r#"{"max_math_errors": 3}"#).unwrap();
        assert_eq!(config.max_math_errors, 3);
        assert_eq!(config.max_tokens, 100_000);
    }

    #[test]
    fn test_breaker_policy_json() {
        let config =
            ValidatorConfig::from_json(r#"{"breaker": {"policy": "cooldown", "runs": 2}}"#).unwrap();
        assert_eq!(config.breaker, BreakerPolicy::Cooldown { runs: 2 });

        let config = ValidatorConfig::from_json(r#"{"breaker": {"policy": "per_run"}}"#).unwrap();
        assert_eq!(config.breaker, BreakerPolicy::PerRun);
    }

    #[test]
    fn test_invalid_json() {
        let err = ValidatorConfig::from_json(r#"{"max_tokens": "many"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ValidatorConfig::load(Path::new("/nonexistent/texlint.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/texlint.json"));
    }
}
