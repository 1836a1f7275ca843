//! Engine configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::chain::cache::DEFAULT_CACHE_CAPACITY;
use crate::foundation::{GuardError, GuardResult};
use crate::rules::FileKinds;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Locale every lookup falls back to (messages, labels, tables)
    pub system_locale: String,

    /// Locale of the current run; `None` means the system locale
    pub locale: Option<String>,

    /// What to do with rule names nobody defines
    pub unknown_rules: UnknownRulePolicy,

    /// Minimum length enforced by the `password` rule
    pub password_min_length: usize,

    /// MIME regexes per file kind, used by `file:<kinds>`, `image`, ...
    pub file_patterns: IndexMap<String, Vec<String>>,

    /// Timeout of the `active_url` reachability probe
    pub probe_timeout_ms: u64,

    /// Maximum number of memoized chains per session
    pub chain_cache_capacity: u64,
}

/// Unknown rule handling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRulePolicy {
    /// Fail with `GuardError::UnknownRule` while building the chain
    #[default]
    Deny,
    /// Log a warning and let the rule pass
    Warn,
}

// ============================================================================
// Implementations
// ============================================================================

fn default_file_patterns() -> IndexMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 5] = [
        ("image", &["^image/(png|gif|jpe?g|webp|bmp)$"]),
        ("video", &["^video/"]),
        ("audio", &["^audio/"]),
        ("pdf", &["^application/pdf$"]),
        (
            "document",
            &[
                "^application/pdf$",
                "^application/msword$",
                r"^application/vnd\.openxmlformats-officedocument\.",
                r"^application/vnd\.oasis\.opendocument\.",
                "^text/plain$",
            ],
        ),
    ];
    table
        .into_iter()
        .map(|(kind, patterns)| {
            (
                kind.to_owned(),
                patterns.iter().map(|p| (*p).to_owned()).collect(),
            )
        })
        .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_locale: "en".to_string(),
            locale: None,
            unknown_rules: UnknownRulePolicy::Deny,
            password_min_length: 8,
            file_patterns: default_file_patterns(),
            probe_timeout_ms: 5_000,
            chain_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(source: &str) -> GuardResult<Self> {
        let config: Self =
            serde_json::from_str(source).map_err(|e| GuardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; missing fields keep their defaults.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(source: &str) -> GuardResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| GuardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `FORMGUARD_LOCALE` and `FORMGUARD_UNKNOWN_RULES` on top of
    /// the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(locale) = std::env::var("FORMGUARD_LOCALE") {
            config.locale = Some(locale);
        }

        if let Ok(policy) = std::env::var("FORMGUARD_UNKNOWN_RULES") {
            config.unknown_rules = match policy.to_lowercase().as_str() {
                "warn" => UnknownRulePolicy::Warn,
                _ => UnknownRulePolicy::Deny,
            };
        }

        config
    }

    /// Locale of the current run.
    #[must_use]
    pub fn active_locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(&self.system_locale)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> GuardResult<()> {
        if self.system_locale.trim().is_empty() {
            return Err(GuardError::Config("system_locale must not be empty".into()));
        }
        if self.chain_cache_capacity == 0 {
            return Err(GuardError::Config("chain_cache_capacity must be positive".into()));
        }
        FileKinds::from_config(&self.file_patterns).map(|_| ())
    }
}
