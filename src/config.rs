//! Run configuration.
//!
//! One serde-friendly struct covers everything a verification run needs:
//! the trust configuration, the load policy, and the tuning knobs of the
//! loader, the inference engine, and the context cache. It can be built
//! from JSON or from environment variables:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `UNTP_TRUSTED_ISSUERS` | Comma-separated trusted issuer ids |
//! | `UNTP_LOAD_POLICY` | `skip` (default) or `abort` |
//! | `UNTP_MAX_RULE_ROUNDS` | Saturation rounds per rule module |

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::types::TrustedIssuers;

/// Default saturation rounds per rule module.
pub const DEFAULT_MAX_ROUNDS_PER_MODULE: usize = 16;

/// Default nesting limit for remote JSON-LD contexts.
pub const DEFAULT_MAX_CONTEXT_DEPTH: usize = 8;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON configuration.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment variable holds an unusable value.
    #[error("Invalid value for {variable}: {value}")]
    InvalidEnv {
        /// Variable name.
        variable: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// What to do when a document fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Record the failure and continue with the remaining documents.
    #[default]
    SkipFailed,
    /// Stop the run at the first failure.
    AbortOnFailure,
}

impl std::str::FromStr for LoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "skip_failed" => Ok(Self::SkipFailed),
            "abort" | "abort_on_failure" => Ok(Self::AbortOnFailure),
            other => Err(other.to_string()),
        }
    }
}

/// JSON-LD loader settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Label quads with a named graph per document.
    pub label_graphs: bool,
    /// Maximum nesting of remote contexts.
    pub max_context_depth: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            label_graphs: true,
            max_context_depth: DEFAULT_MAX_CONTEXT_DEPTH,
        }
    }
}

/// Inference engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Saturation rounds allowed within one module before it fails.
    pub max_rounds_per_module: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_rounds_per_module: DEFAULT_MAX_ROUNDS_PER_MODULE,
        }
    }
}

/// Configuration for the JSON-LD context cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            enabled: true,
        }
    }
}

/// Configuration of a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Issuers trusted without an identity anchor.
    pub trusted_issuers: TrustedIssuers,
    /// Behaviour on document load failure.
    pub load_policy: LoadPolicy,
    /// Loader settings.
    pub loader: LoaderConfig,
    /// Inference settings.
    pub inference: InferenceConfig,
    /// Context cache settings.
    pub context_cache: CacheConfig,
}

impl VerificationConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a configuration from `UNTP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(issuers) = lookup("UNTP_TRUSTED_ISSUERS") {
            config.trusted_issuers = issuers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(policy) = lookup("UNTP_LOAD_POLICY") {
            config.load_policy = policy.parse().map_err(|value| ConfigError::InvalidEnv {
                variable: "UNTP_LOAD_POLICY",
                value,
            })?;
        }

        if let Some(rounds) = lookup("UNTP_MAX_RULE_ROUNDS") {
            config.inference.max_rounds_per_module = rounds
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidEnv {
                    variable: "UNTP_MAX_RULE_ROUNDS",
                    value: rounds,
                })?;
        }

        Ok(config)
    }

    /// Add a trusted issuer.
    pub fn with_trusted_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.trusted_issuers.insert(issuer);
        self
    }

    /// Set the load policy.
    pub fn with_load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    /// Fingerprint of the configuration, recorded in reports.
    ///
    /// Cache settings do not affect results and are excluded.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&(
            &self.trusted_issuers,
            &self.load_policy,
            &self.loader,
            &self.inference,
        ))
    }
}
